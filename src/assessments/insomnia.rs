// Insomnia Severity Index: 7 items scored 0..4, total 0..28

use super::{AssessmentKind, Band, Question, Questionnaire, ScaleOption};

const fn item(id: &'static str, text_key: &'static str) -> Question {
    Question {
        id,
        text_key,
        reverse: false,
        trait_: None,
    }
}

const QUESTIONS: [Question; 7] = [
    item("q1", "assessments.insomnia.questions.q1"),
    item("q2", "assessments.insomnia.questions.q2"),
    item("q3", "assessments.insomnia.questions.q3"),
    item("q4", "assessments.insomnia.questions.q4"),
    item("q5", "assessments.insomnia.questions.q5"),
    item("q6", "assessments.insomnia.questions.q6"),
    item("q7", "assessments.insomnia.questions.q7"),
];

const OPTIONS: [ScaleOption; 5] = [
    ScaleOption { label_key: "scales.severity.none", value: 0 },
    ScaleOption { label_key: "scales.severity.mild", value: 1 },
    ScaleOption { label_key: "scales.severity.moderate", value: 2 },
    ScaleOption { label_key: "scales.severity.severe", value: 3 },
    ScaleOption { label_key: "scales.severity.very_severe", value: 4 },
];

const BANDS: [Band; 4] = [
    Band { min: 0, max: 7, feedback_key: "assessments.insomnia.feedback.none" },
    Band { min: 8, max: 14, feedback_key: "assessments.insomnia.feedback.subthreshold" },
    Band { min: 15, max: 21, feedback_key: "assessments.insomnia.feedback.moderate" },
    Band { min: 22, max: 28, feedback_key: "assessments.insomnia.feedback.severe" },
];

pub static QUESTIONNAIRE: Questionnaire = Questionnaire {
    kind: AssessmentKind::Insomnia,
    title_key: "assessments.insomnia.title",
    description_key: "assessments.insomnia.description",
    questions: &QUESTIONS,
    options: &OPTIONS,
    bands: &BANDS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessments::test_support::answers_with;

    #[test]
    fn test_range_is_zero_to_twenty_eight() {
        let none = QUESTIONNAIRE.score_complete(&answers_with(&QUESTIONNAIRE, |_| 0)).unwrap();
        let worst = QUESTIONNAIRE.score_complete(&answers_with(&QUESTIONNAIRE, |_| 4)).unwrap();
        assert_eq!(none.total, 0);
        assert_eq!(worst.total, 28);
    }

    #[test]
    fn test_mixed_answers_hand_computed() {
        // 1 + 2 + 3 + 2 + 1 + 0 + 4 = 13 -> subthreshold
        let picks = [1usize, 2, 3, 2, 1, 0, 4];
        let answers = answers_with(&QUESTIONNAIRE, |q| {
            let n: usize = q.id[1..].parse().unwrap();
            picks[n - 1]
        });
        let score = QUESTIONNAIRE.score_complete(&answers).unwrap();
        assert_eq!(score.total, 13);
        assert_eq!(
            AssessmentKind::Insomnia.feedback_key(&score),
            "assessments.insomnia.feedback.subthreshold"
        );
    }
}
