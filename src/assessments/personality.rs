// Ten-Item Personality Inventory
// 10 items on the 7-point agreement scale; even items are reverse scored.
// Each trait is the mean of its two items.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::life_satisfaction::AGREEMENT;
use super::{AssessmentKind, Question, Questionnaire};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityTrait {
    Extraversion,
    Agreeableness,
    Conscientiousness,
    EmotionalStability,
    Openness,
}

impl PersonalityTrait {
    pub const ALL: [PersonalityTrait; 5] = [
        PersonalityTrait::Extraversion,
        PersonalityTrait::Agreeableness,
        PersonalityTrait::Conscientiousness,
        PersonalityTrait::EmotionalStability,
        PersonalityTrait::Openness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonalityTrait::Extraversion => "extraversion",
            PersonalityTrait::Agreeableness => "agreeableness",
            PersonalityTrait::Conscientiousness => "conscientiousness",
            PersonalityTrait::EmotionalStability => "emotional_stability",
            PersonalityTrait::Openness => "openness",
        }
    }
}

const fn item(
    id: &'static str,
    text_key: &'static str,
    reverse: bool,
    trait_: PersonalityTrait,
) -> Question {
    Question {
        id,
        text_key,
        reverse,
        trait_: Some(trait_),
    }
}

use PersonalityTrait::*;

const QUESTIONS: [Question; 10] = [
    item("q1", "assessments.personality.questions.q1", false, Extraversion),
    item("q2", "assessments.personality.questions.q2", true, Agreeableness),
    item("q3", "assessments.personality.questions.q3", false, Conscientiousness),
    item("q4", "assessments.personality.questions.q4", true, EmotionalStability),
    item("q5", "assessments.personality.questions.q5", false, Openness),
    item("q6", "assessments.personality.questions.q6", true, Extraversion),
    item("q7", "assessments.personality.questions.q7", false, Agreeableness),
    item("q8", "assessments.personality.questions.q8", true, Conscientiousness),
    item("q9", "assessments.personality.questions.q9", false, EmotionalStability),
    item("q10", "assessments.personality.questions.q10", true, Openness),
];

pub static QUESTIONNAIRE: Questionnaire = Questionnaire {
    kind: AssessmentKind::Personality,
    title_key: "assessments.personality.title",
    description_key: "assessments.personality.description",
    questions: &QUESTIONS,
    options: &AGREEMENT,
    bands: &[],
};

/// Mean item score per trait (1.0 ..= 7.0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitProfile {
    pub traits: BTreeMap<String, f64>,
}

impl TraitProfile {
    /// Build from a scored breakdown (question id -> item score).
    /// Traits with no answered items are left out.
    pub fn from_breakdown(breakdown: &BTreeMap<String, i32>) -> Self {
        let mut sums: BTreeMap<&'static str, (i32, u32)> = BTreeMap::new();

        for question in QUESTIONS.iter() {
            let (Some(t), Some(score)) = (question.trait_, breakdown.get(question.id)) else {
                continue;
            };
            let entry = sums.entry(t.as_str()).or_insert((0, 0));
            entry.0 += score;
            entry.1 += 1;
        }

        let traits = sums
            .into_iter()
            .map(|(name, (sum, count))| (name.to_string(), sum as f64 / count as f64))
            .collect();

        Self { traits }
    }

    pub fn get(&self, t: PersonalityTrait) -> Option<f64> {
        self.traits.get(t.as_str()).copied()
    }

    /// Highest-scoring trait; ties go to the earlier trait in `PersonalityTrait::ALL`
    pub fn dominant(&self) -> PersonalityTrait {
        let mut best = PersonalityTrait::ALL[0];
        let mut best_score = f64::MIN;
        for t in PersonalityTrait::ALL {
            if let Some(score) = self.get(t) {
                if score > best_score {
                    best = t;
                    best_score = score;
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessments::test_support::answers_with;

    #[test]
    fn test_total_range() {
        let low = answers_with(&QUESTIONNAIRE, |q| if q.reverse { 6 } else { 0 });
        let high = answers_with(&QUESTIONNAIRE, |q| if q.reverse { 0 } else { 6 });
        assert_eq!(QUESTIONNAIRE.score_complete(&low).unwrap().total, 10);
        assert_eq!(QUESTIONNAIRE.score_complete(&high).unwrap().total, 70);
    }

    #[test]
    fn test_trait_means_and_dominant() {
        // Neutral everywhere, except openness items pushed to the top
        let answers = answers_with(&QUESTIONNAIRE, |q| match (q.id, q.reverse) {
            ("q5", _) => 6,
            ("q10", _) => 0,
            _ => 3,
        });
        let score = QUESTIONNAIRE.score_complete(&answers).unwrap();
        let profile = TraitProfile::from_breakdown(&score.breakdown);

        assert_eq!(profile.get(Openness), Some(7.0));
        assert_eq!(profile.get(Extraversion), Some(4.0));
        assert_eq!(profile.dominant(), Openness);
        assert_eq!(
            AssessmentKind::Personality.feedback_key(&score),
            "assessments.personality.feedback.openness"
        );
    }

    #[test]
    fn test_tie_goes_to_first_trait() {
        let answers = answers_with(&QUESTIONNAIRE, |_| 3);
        let score = QUESTIONNAIRE.score(&answers).unwrap();
        let profile = TraitProfile::from_breakdown(&score.breakdown);
        assert_eq!(profile.dominant(), Extraversion);
    }

    #[test]
    fn test_partial_profile_skips_unanswered_traits() {
        let mut breakdown = BTreeMap::new();
        breakdown.insert("q3".to_string(), 6);
        let profile = TraitProfile::from_breakdown(&breakdown);
        assert_eq!(profile.traits.len(), 1);
        assert_eq!(profile.dominant(), Conscientiousness);
    }
}
