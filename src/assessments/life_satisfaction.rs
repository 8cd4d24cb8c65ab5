// Satisfaction With Life Scale: 5 items on a 7-point agreement scale, total 5..35

use super::{AssessmentKind, Band, Question, Questionnaire, ScaleOption};

const fn item(id: &'static str, text_key: &'static str) -> Question {
    Question {
        id,
        text_key,
        reverse: false,
        trait_: None,
    }
}

const QUESTIONS: [Question; 5] = [
    item("q1", "assessments.life_satisfaction.questions.q1"),
    item("q2", "assessments.life_satisfaction.questions.q2"),
    item("q3", "assessments.life_satisfaction.questions.q3"),
    item("q4", "assessments.life_satisfaction.questions.q4"),
    item("q5", "assessments.life_satisfaction.questions.q5"),
];

pub(crate) const AGREEMENT: [ScaleOption; 7] = [
    ScaleOption { label_key: "scales.agreement.strongly_disagree", value: 1 },
    ScaleOption { label_key: "scales.agreement.disagree", value: 2 },
    ScaleOption { label_key: "scales.agreement.slightly_disagree", value: 3 },
    ScaleOption { label_key: "scales.agreement.neutral", value: 4 },
    ScaleOption { label_key: "scales.agreement.slightly_agree", value: 5 },
    ScaleOption { label_key: "scales.agreement.agree", value: 6 },
    ScaleOption { label_key: "scales.agreement.strongly_agree", value: 7 },
];

const BANDS: [Band; 7] = [
    Band { min: 5, max: 9, feedback_key: "assessments.life_satisfaction.feedback.extremely_dissatisfied" },
    Band { min: 10, max: 14, feedback_key: "assessments.life_satisfaction.feedback.dissatisfied" },
    Band { min: 15, max: 19, feedback_key: "assessments.life_satisfaction.feedback.slightly_dissatisfied" },
    Band { min: 20, max: 20, feedback_key: "assessments.life_satisfaction.feedback.neutral" },
    Band { min: 21, max: 25, feedback_key: "assessments.life_satisfaction.feedback.slightly_satisfied" },
    Band { min: 26, max: 30, feedback_key: "assessments.life_satisfaction.feedback.satisfied" },
    Band { min: 31, max: 35, feedback_key: "assessments.life_satisfaction.feedback.extremely_satisfied" },
];

pub static QUESTIONNAIRE: Questionnaire = Questionnaire {
    kind: AssessmentKind::LifeSatisfaction,
    title_key: "assessments.life_satisfaction.title",
    description_key: "assessments.life_satisfaction.description",
    questions: &QUESTIONS,
    options: &AGREEMENT,
    bands: &BANDS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessments::test_support::answers_with;

    #[test]
    fn test_range_is_five_to_thirty_five() {
        let min = QUESTIONNAIRE.score_complete(&answers_with(&QUESTIONNAIRE, |_| 0)).unwrap();
        let max = QUESTIONNAIRE.score_complete(&answers_with(&QUESTIONNAIRE, |_| 6)).unwrap();
        assert_eq!(min.total, 5);
        assert_eq!(max.total, 35);
    }

    #[test]
    fn test_neutral_point_is_twenty() {
        // All "neutral" answers give 5 * 4 = 20
        let score = QUESTIONNAIRE.score_complete(&answers_with(&QUESTIONNAIRE, |_| 3)).unwrap();
        assert_eq!(score.total, 20);
        assert_eq!(
            AssessmentKind::LifeSatisfaction.feedback_key(&score),
            "assessments.life_satisfaction.feedback.neutral"
        );
    }
}
