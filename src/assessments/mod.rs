// Self-assessment questionnaires and their scoring
//
// Each instrument is static data: ordered questions, one option scale and the
// score bands used to pick feedback. Scoring is a pure reduction over an
// answers map of question id -> selected option index.

pub mod insomnia;
pub mod life_satisfaction;
pub mod personality;
pub mod worry;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use personality::{PersonalityTrait, TraitProfile};

/// The four questionnaires offered in the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    Worry,
    Insomnia,
    LifeSatisfaction,
    Personality,
}

impl AssessmentKind {
    pub const ALL: [AssessmentKind; 4] = [
        AssessmentKind::Worry,
        AssessmentKind::Insomnia,
        AssessmentKind::LifeSatisfaction,
        AssessmentKind::Personality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentKind::Worry => "worry",
            AssessmentKind::Insomnia => "insomnia",
            AssessmentKind::LifeSatisfaction => "life_satisfaction",
            AssessmentKind::Personality => "personality",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Top-level Firestore collection holding results of this kind
    pub fn collection(&self) -> String {
        format!("{}_scores", self.as_str())
    }

    pub fn questionnaire(&self) -> &'static Questionnaire {
        match self {
            AssessmentKind::Worry => &worry::QUESTIONNAIRE,
            AssessmentKind::Insomnia => &insomnia::QUESTIONNAIRE,
            AssessmentKind::LifeSatisfaction => &life_satisfaction::QUESTIONNAIRE,
            AssessmentKind::Personality => &personality::QUESTIONNAIRE,
        }
    }

    /// Feedback translation key for a computed score.
    /// Personality feedback follows the dominant trait, the others use score bands.
    pub fn feedback_key(&self, score: &Score) -> String {
        match self {
            AssessmentKind::Personality => {
                let profile = TraitProfile::from_breakdown(&score.breakdown);
                format!(
                    "assessments.personality.feedback.{}",
                    profile.dominant().as_str()
                )
            }
            _ => self
                .questionnaire()
                .band(score.total)
                .map(|b| b.feedback_key.to_string())
                .unwrap_or_else(|| format!("assessments.{}.feedback.unknown", self.as_str())),
        }
    }
}

/// One selectable answer on a questionnaire's scale
#[derive(Debug, Clone, Serialize)]
pub struct ScaleOption {
    pub label_key: &'static str,
    pub value: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub text_key: &'static str,
    /// Reverse-scored: option values are mirrored across the scale
    pub reverse: bool,
    #[serde(rename = "trait", skip_serializing_if = "Option::is_none")]
    pub trait_: Option<PersonalityTrait>,
}

/// Inclusive score range mapped to a feedback text
#[derive(Debug, Clone, Serialize)]
pub struct Band {
    pub min: i32,
    pub max: i32,
    pub feedback_key: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Questionnaire {
    pub kind: AssessmentKind,
    pub title_key: &'static str,
    pub description_key: &'static str,
    pub questions: &'static [Question],
    pub options: &'static [ScaleOption],
    pub bands: &'static [Band],
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("unknown question {0}")]
    UnknownQuestion(String),
    #[error("option {option} out of range for question {question}")]
    OptionOutOfRange { question: String, option: usize },
    #[error("question {0} is unanswered")]
    Unanswered(String),
}

/// Result of scoring an answers map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub total: i32,
    /// Per-question item score after reverse scoring
    pub breakdown: BTreeMap<String, i32>,
}

impl Questionnaire {
    fn scale_bounds(&self) -> (i32, i32) {
        let min = self.options.iter().map(|o| o.value).min().unwrap_or(0);
        let max = self.options.iter().map(|o| o.value).max().unwrap_or(0);
        (min, max)
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Item score for the option at `option` on question `q`
    pub fn item_score(&self, q: &Question, option: usize) -> Result<i32, ScoringError> {
        let value = self
            .options
            .get(option)
            .map(|o| o.value)
            .ok_or_else(|| ScoringError::OptionOutOfRange {
                question: q.id.to_string(),
                option,
            })?;

        if q.reverse {
            let (min, max) = self.scale_bounds();
            Ok(min + max - value)
        } else {
            Ok(value)
        }
    }

    /// Sum of item scores over answered questions
    pub fn score(&self, answers: &BTreeMap<String, usize>) -> Result<Score, ScoringError> {
        let mut breakdown = BTreeMap::new();
        let mut total = 0;

        for (question_id, option) in answers {
            let question = self
                .question(question_id)
                .ok_or_else(|| ScoringError::UnknownQuestion(question_id.clone()))?;
            let item = self.item_score(question, *option)?;
            total += item;
            breakdown.insert(question_id.clone(), item);
        }

        Ok(Score { total, breakdown })
    }

    /// Like `score`, but every question must be answered
    pub fn score_complete(&self, answers: &BTreeMap<String, usize>) -> Result<Score, ScoringError> {
        if let Some(missing) = self.questions.iter().find(|q| !answers.contains_key(q.id)) {
            return Err(ScoringError::Unanswered(missing.id.to_string()));
        }
        self.score(answers)
    }

    pub fn min_score(&self) -> i32 {
        self.scale_bounds().0 * self.questions.len() as i32
    }

    pub fn max_score(&self) -> i32 {
        self.scale_bounds().1 * self.questions.len() as i32
    }

    pub fn band(&self, total: i32) -> Option<&Band> {
        self.bands.iter().find(|b| (b.min..=b.max).contains(&total))
    }
}
