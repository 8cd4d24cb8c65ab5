// Nature sound catalog routes
// Endpoints: /v1/sounds

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::auth::AuthUser;
use crate::models::{ListSoundsQuery, NatureSound};
use crate::AppState;

/// GET /v1/sounds - catalog, optionally one category
async fn list_sounds(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListSoundsQuery>,
) -> Result<Json<Vec<NatureSound>>, StatusCode> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    tracing::info!("Listing nature sounds (category: {:?})", category);

    match state.firestore.list_nature_sounds(category).await {
        Ok(sounds) => Ok(Json(sounds)),
        Err(e) => {
            tracing::error!("Failed to list nature sounds: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub fn sounds_routes() -> Router<AppState> {
    Router::new().route("/v1/sounds", get(list_sounds))
}
