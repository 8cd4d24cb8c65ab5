// Assessment routes
// Endpoints: /v1/assessments/*

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::assessments::{AssessmentKind, TraitProfile};
use crate::auth::AuthUser;
use crate::i18n::Translator;
use crate::models::{
    ActivityCategory, LocalizedOption, LocalizedQuestion, LocalizedQuestionnaire, StatusResponse,
    SubmitAnswersRequest, TestResult, TestResultResponse,
};
use crate::routes::{track_activity, translator_for};
use crate::AppState;

type ApiError = (StatusCode, String);

fn parse_kind(kind: &str) -> Result<AssessmentKind, ApiError> {
    AssessmentKind::parse(kind)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown assessment {}", kind)))
}

fn localize(kind: AssessmentKind, translator: &Translator) -> LocalizedQuestionnaire {
    let q = kind.questionnaire();
    LocalizedQuestionnaire {
        kind,
        title: translator.t(q.title_key),
        description: translator.t(q.description_key),
        min_score: q.min_score(),
        max_score: q.max_score(),
        questions: q
            .questions
            .iter()
            .map(|question| LocalizedQuestion {
                id: question.id.to_string(),
                text: translator.t(question.text_key),
            })
            .collect(),
        options: q
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| LocalizedOption {
                index,
                label: translator.t(option.label_key),
            })
            .collect(),
    }
}

fn with_feedback(result: TestResult, translator: &Translator) -> TestResultResponse {
    TestResultResponse {
        feedback: translator.t(&result.feedback_key),
        result,
    }
}

/// GET /v1/assessments - every questionnaire in the caller's language
async fn list_assessments(
    user: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<LocalizedQuestionnaire>> {
    let translator = translator_for(&state, &user.uid).await;
    Json(
        AssessmentKind::ALL
            .into_iter()
            .map(|kind| localize(kind, &translator))
            .collect(),
    )
}

/// GET /v1/assessments/:kind
async fn get_assessment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<LocalizedQuestionnaire>, ApiError> {
    let kind = parse_kind(&kind)?;
    let translator = translator_for(&state, &user.uid).await;
    Ok(Json(localize(kind, &translator)))
}

/// POST /v1/assessments/:kind/results - score a complete answer set and store it
async fn submit_answers(
    user: AuthUser,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(request): Json<SubmitAnswersRequest>,
) -> Result<(StatusCode, Json<TestResultResponse>), ApiError> {
    let kind = parse_kind(&kind)?;
    tracing::info!("Scoring {} assessment for user {}", kind.as_str(), user.uid);

    let score = kind
        .questionnaire()
        .score_complete(&request.answers)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let traits = (kind == AssessmentKind::Personality)
        .then(|| TraitProfile::from_breakdown(&score.breakdown).traits);

    let result = TestResult {
        id: uuid::Uuid::new_v4().to_string(),
        uid: user.uid.clone(),
        kind,
        score: score.total,
        feedback_key: kind.feedback_key(&score),
        answers: request.answers,
        breakdown: score.breakdown,
        traits,
        created_at: Utc::now(),
    };

    state.firestore.create_test_result(&result).await.map_err(|e| {
        tracing::error!("Failed to store test result: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    let translator = translator_for(&state, &user.uid).await;
    track_activity(
        &state,
        &user.uid,
        ActivityCategory::Assessment,
        Some(translator.t(kind.questionnaire().title_key)),
    )
    .await;

    Ok((StatusCode::CREATED, Json(with_feedback(result, &translator))))
}

#[derive(Debug, Deserialize)]
struct ListResultsQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    20
}

/// GET /v1/assessments/:kind/results - caller's results, newest first
async fn list_results(
    user: AuthUser,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ListResultsQuery>,
) -> Result<Json<Vec<TestResultResponse>>, ApiError> {
    let kind = parse_kind(&kind)?;
    tracing::info!("Listing {} results for user {}", kind.as_str(), user.uid);

    let results = state
        .firestore
        .list_test_results(&user.uid, kind, query.limit.clamp(1, 100))
        .await
        .map_err(|e| {
            tracing::error!("Failed to list test results: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    let translator = translator_for(&state, &user.uid).await;
    Ok(Json(
        results
            .into_iter()
            .map(|r| with_feedback(r, &translator))
            .collect(),
    ))
}

/// DELETE /v1/assessments/:kind/results/:id - owner only
async fn delete_result(
    user: AuthUser,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<StatusResponse>, ApiError> {
    let kind = parse_kind(&kind)?;

    let result = state
        .firestore
        .get_test_result(kind, &id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get test result: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?
        .ok_or((StatusCode::NOT_FOUND, "Result not found".to_string()))?;

    if result.uid != user.uid {
        tracing::warn!("User {} tried to delete result {} owned by another user", user.uid, id);
        return Err((StatusCode::FORBIDDEN, "Not your result".to_string()));
    }

    state
        .firestore
        .delete_test_result(kind, &id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete test result: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

pub fn assessments_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/assessments", get(list_assessments))
        .route("/v1/assessments/:kind", get(get_assessment))
        .route(
            "/v1/assessments/:kind/results",
            get(list_results).post(submit_answers),
        )
        .route("/v1/assessments/:kind/results/:id", delete(delete_result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locales;

    #[test]
    fn test_localize_resolves_every_text() {
        let locales = Locales::bundled("en").unwrap();
        let translator = locales.translator(Some("es"));
        for kind in AssessmentKind::ALL {
            let localized = localize(kind, &translator);
            assert!(!localized.title.starts_with("assessments."));
            assert_eq!(localized.questions.len(), kind.questionnaire().questions.len());
            assert!(localized.questions.iter().all(|q| !q.text.starts_with("assessments.")));
            assert!(localized.options.iter().all(|o| !o.label.starts_with("scales.")));
        }
    }

    #[test]
    fn test_worry_localized_range() {
        let locales = Locales::bundled("en").unwrap();
        let localized = localize(AssessmentKind::Worry, &locales.translator(None));
        assert_eq!((localized.min_score, localized.max_score), (16, 80));
        assert_eq!(localized.options.len(), 5);
    }

    #[test]
    fn test_unknown_kind_is_not_found() {
        assert_eq!(parse_kind("mood").unwrap_err().0, StatusCode::NOT_FOUND);
        assert_eq!(parse_kind("insomnia").unwrap(), AssessmentKind::Insomnia);
    }
}
