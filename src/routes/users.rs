// User profile routes
// Endpoints: /v1/users/me/*

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;

use crate::auth::AuthUser;
use crate::models::{
    RecentActivity, RecordActivityRequest, RecordActivityResponse, StatusResponse,
    UpdateLanguageRequest, UpdateProfileRequest, UserProfile,
};
use crate::routes::sse_snapshots;
use crate::services::watch;
use crate::AppState;

const NAME_MAX_LEN: usize = 60;

/// GET /v1/users/me - profile, created on first access
async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, StatusCode> {
    tracing::info!(
        "Getting profile for user {} ({})",
        user.uid,
        user.email.as_deref().unwrap_or("no email")
    );

    match state.firestore.get_or_create_user_profile(&user.uid).await {
        Ok(profile) => Ok(Json(profile)),
        Err(e) => {
            tracing::error!("Failed to get profile: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// PATCH /v1/users/me - update name and avatar
async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, StatusCode> {
    tracing::info!("Updating profile for user {}", user.uid);

    let name = request.name.as_deref().map(str::trim);
    if let Some(name) = name {
        if name.is_empty() || name.chars().count() > NAME_MAX_LEN {
            return Err(StatusCode::BAD_REQUEST);
        }
    }

    match state
        .firestore
        .update_user_profile(&user.uid, name, request.avatar.as_deref())
        .await
    {
        Ok(profile) => Ok(Json(profile)),
        Err(e) => {
            tracing::error!("Failed to update profile: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// PUT /v1/users/me/language - switch locale
async fn update_language(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<UpdateLanguageRequest>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    tracing::info!("Setting language for user {} to {}", user.uid, request.language);

    if !state.locales.is_supported(&request.language) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Unsupported language {}; available: {}",
                request.language,
                state.locales.codes().join(", ")
            ),
        ));
    }

    state
        .firestore
        .update_user_language(&user.uid, &request.language)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update language: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

/// POST /v1/users/me/activities - record an activity
async fn record_activity(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<RecordActivityRequest>,
) -> Result<Json<RecordActivityResponse>, StatusCode> {
    tracing::info!(
        "Recording {} activity for user {}",
        request.category.as_str(),
        user.uid
    );

    let mut profile = state
        .firestore
        .get_or_create_user_profile(&user.uid)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get profile: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let unlocked = profile.record_activity(RecentActivity {
        category: request.category,
        title: request.title,
        at: Utc::now(),
    });

    if let Err(e) = state.firestore.save_user_profile(&user.uid, &profile).await {
        tracing::error!("Failed to save profile: {}", e);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    Ok(Json(RecordActivityResponse {
        profile,
        unlocked: unlocked.into_iter().map(String::from).collect(),
    }))
}

/// GET /v1/users/me/stream - profile snapshots over SSE
async fn stream_profile(State(state): State<AppState>, user: AuthUser) -> impl IntoResponse {
    tracing::info!("Subscribing to profile of user {}", user.uid);

    let firestore = state.firestore.clone();
    let uid = user.uid;
    let subscription = watch(state.config.subscription_poll_interval, move || {
        let firestore = firestore.clone();
        let uid = uid.clone();
        async move { firestore.get_or_create_user_profile(&uid).await }
    });

    sse_snapshots(subscription)
}

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/users/me", get(get_profile).patch(update_profile))
        .route("/v1/users/me/language", put(update_language))
        .route("/v1/users/me/activities", post(record_activity))
        .route("/v1/users/me/stream", get(stream_profile))
}
