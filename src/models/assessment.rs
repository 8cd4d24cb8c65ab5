// Assessment result models
// Path: {kind}_scores/{result_id}, owned through the `uid` field

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assessments::AssessmentKind;

/// A stored questionnaire result. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    #[serde(default)]
    pub id: String,
    pub uid: String,
    pub kind: AssessmentKind,
    pub score: i32,
    /// question id -> selected option index
    pub answers: BTreeMap<String, usize>,
    /// question id -> item score after reverse scoring
    pub breakdown: BTreeMap<String, i32>,
    pub feedback_key: String,
    /// Trait means, personality results only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traits: Option<BTreeMap<String, f64>>,
    pub created_at: DateTime<Utc>,
}

/// Request body for POST /v1/assessments/:kind/results
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: BTreeMap<String, usize>,
}

/// Result plus the localized feedback text
#[derive(Debug, Clone, Serialize)]
pub struct TestResultResponse {
    #[serde(flatten)]
    pub result: TestResult,
    pub feedback: String,
}

/// Localized questionnaire returned to the client
#[derive(Debug, Clone, Serialize)]
pub struct LocalizedQuestionnaire {
    pub kind: AssessmentKind,
    pub title: String,
    pub description: String,
    pub min_score: i32,
    pub max_score: i32,
    pub questions: Vec<LocalizedQuestion>,
    pub options: Vec<LocalizedOption>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocalizedQuestion {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocalizedOption {
    pub index: usize,
    pub label: String,
}

/// Status response for delete operations
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
}
