// Worry scale (Penn State Worry Questionnaire, 16 items)
// Options run Never (1) .. Always (5); items 1, 3, 8, 10 and 11 are reverse scored.

use super::{AssessmentKind, Band, Question, Questionnaire, ScaleOption};

const fn item(id: &'static str, text_key: &'static str, reverse: bool) -> Question {
    Question {
        id,
        text_key,
        reverse,
        trait_: None,
    }
}

const QUESTIONS: [Question; 16] = [
    item("q1", "assessments.worry.questions.q1", true),
    item("q2", "assessments.worry.questions.q2", false),
    item("q3", "assessments.worry.questions.q3", true),
    item("q4", "assessments.worry.questions.q4", false),
    item("q5", "assessments.worry.questions.q5", false),
    item("q6", "assessments.worry.questions.q6", false),
    item("q7", "assessments.worry.questions.q7", false),
    item("q8", "assessments.worry.questions.q8", true),
    item("q9", "assessments.worry.questions.q9", false),
    item("q10", "assessments.worry.questions.q10", true),
    item("q11", "assessments.worry.questions.q11", true),
    item("q12", "assessments.worry.questions.q12", false),
    item("q13", "assessments.worry.questions.q13", false),
    item("q14", "assessments.worry.questions.q14", false),
    item("q15", "assessments.worry.questions.q15", false),
    item("q16", "assessments.worry.questions.q16", false),
];

const OPTIONS: [ScaleOption; 5] = [
    ScaleOption { label_key: "scales.frequency.never", value: 1 },
    ScaleOption { label_key: "scales.frequency.rarely", value: 2 },
    ScaleOption { label_key: "scales.frequency.sometimes", value: 3 },
    ScaleOption { label_key: "scales.frequency.often", value: 4 },
    ScaleOption { label_key: "scales.frequency.always", value: 5 },
];

const BANDS: [Band; 3] = [
    Band { min: 16, max: 39, feedback_key: "assessments.worry.feedback.low" },
    Band { min: 40, max: 59, feedback_key: "assessments.worry.feedback.moderate" },
    Band { min: 60, max: 80, feedback_key: "assessments.worry.feedback.high" },
];

pub static QUESTIONNAIRE: Questionnaire = Questionnaire {
    kind: AssessmentKind::Worry,
    title_key: "assessments.worry.title",
    description_key: "assessments.worry.description",
    questions: &QUESTIONS,
    options: &OPTIONS,
    bands: &BANDS,
};
