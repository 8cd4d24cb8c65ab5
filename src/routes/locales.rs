// Translation routes
// Endpoints: /v1/locales/:code, /v1/translate

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthUser;
use crate::routes::translator_for;
use crate::AppState;

#[derive(Debug, Deserialize)]
struct TranslateQuery {
    key: String,
}

#[derive(Debug, Serialize)]
struct TranslateResponse {
    language: String,
    key: String,
    text: String,
}

#[derive(Debug, Serialize)]
struct LocaleList {
    default: String,
    available: Vec<String>,
}

/// GET /v1/locales
async fn list_locales(State(state): State<AppState>) -> Json<LocaleList> {
    Json(LocaleList {
        default: state.config.default_locale.clone(),
        available: state.locales.codes(),
    })
}

/// GET /v1/locales/:code - full locale table
async fn get_locale(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.locales.table(&code) {
        Some(table) => Ok(Json(table.as_ref().clone())),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// GET /v1/translate?key= - resolve a key in the caller's language
async fn translate(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TranslateQuery>,
) -> Json<TranslateResponse> {
    let translator = translator_for(&state, &user.uid).await;
    Json(TranslateResponse {
        language: translator.code().to_string(),
        text: translator.t(&query.key),
        key: query.key,
    })
}

pub fn locales_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/locales", get(list_locales))
        .route("/v1/locales/:code", get(get_locale))
        .route("/v1/translate", get(translate))
}
