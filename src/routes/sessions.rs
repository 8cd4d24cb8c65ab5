// Chat session routes
// Endpoints: /v1/sessions/*

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::i18n::TextKey;
use crate::llm::{client::build_messages, fallback, system_prompt, HISTORY_WINDOW};
use crate::models::{
    ActivityCategory, ChatSession, CreateSessionRequest, GetMessagesQuery, Message,
    RenameSessionRequest, SendMessageRequest, SendMessageResponse,
};
use crate::routes::{sse_snapshots, track_activity, translator_for};
use crate::services::watch;
use crate::AppState;

const SESSION_LIST_LIMIT: usize = 50;
const MESSAGE_LIST_MAX: usize = 500;
const MESSAGE_MAX_CHARS: usize = 4000;
const TITLE_MAX_CHARS: usize = 100;

type ApiError = (StatusCode, String);

fn internal(context: &str, e: impl std::fmt::Display) -> ApiError {
    tracing::error!("{}: {}", context, e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

async fn load_session(state: &AppState, uid: &str, session_id: &str) -> Result<ChatSession, ApiError> {
    match state.firestore.get_chat_session(uid, session_id).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Session not found".to_string())),
        Err(e) => Err(internal("Failed to get chat session", e)),
    }
}

#[derive(Debug, Deserialize)]
struct ListSessionsQuery {
    #[serde(default = "default_session_limit")]
    limit: usize,
}

fn default_session_limit() -> usize {
    SESSION_LIST_LIMIT
}

/// GET /v1/sessions - most recently active first
async fn list_sessions(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<Vec<ChatSession>>, ApiError> {
    tracing::info!("Listing chat sessions for user {}", user.uid);

    let sessions = state
        .firestore
        .list_chat_sessions(&user.uid, query.limit.clamp(1, SESSION_LIST_LIMIT))
        .await
        .map_err(|e| internal("Failed to list chat sessions", e))?;

    Ok(Json(sessions))
}

/// POST /v1/sessions - create a session opened with a greeting
async fn create_session(
    user: AuthUser,
    State(state): State<AppState>,
    request: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<ChatSession>), ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let translator = translator_for(&state, &user.uid).await;

    let session = ChatSession::new(request.title, &translator.text(TextKey::ChatDefaultTitle));
    tracing::info!("Creating chat session {} for user {}", session.id, user.uid);

    state
        .firestore
        .create_chat_session(&user.uid, &session)
        .await
        .map_err(|e| internal("Failed to create chat session", e))?;

    let greeting = Message::ai(translator.text(TextKey::ChatGreeting));
    let session = state
        .firestore
        .add_message(&user.uid, &session, &greeting)
        .await
        .map_err(|e| internal("Failed to add greeting", e))?;

    track_activity(&state, &user.uid, ActivityCategory::Chat, Some(session.title.clone())).await;

    Ok((StatusCode::CREATED, Json(session)))
}

/// PATCH /v1/sessions/:id - rename
async fn rename_session(
    user: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<RenameSessionRequest>,
) -> Result<Json<ChatSession>, ApiError> {
    let title = request.title.trim();
    if title.is_empty() || title.chars().count() > TITLE_MAX_CHARS {
        return Err((StatusCode::BAD_REQUEST, "Invalid title".to_string()));
    }

    let mut session = load_session(&state, &user.uid, &session_id).await?;
    tracing::info!("Renaming chat session {} for user {}", session_id, user.uid);

    state
        .firestore
        .rename_chat_session(&user.uid, &session_id, title)
        .await
        .map_err(|e| internal("Failed to rename chat session", e))?;

    session.title = title.to_string();
    session.default_title = false;
    Ok(Json(session))
}

#[derive(Debug, Serialize)]
struct DeleteSessionResponse {
    deleted_messages: usize,
}

/// DELETE /v1/sessions/:id - remove the session and its messages
async fn delete_session(
    user: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteSessionResponse>, ApiError> {
    load_session(&state, &user.uid, &session_id).await?;

    let deleted_messages = state
        .firestore
        .delete_chat_session(&user.uid, &session_id)
        .await
        .map_err(|e| internal("Failed to delete chat session", e))?;

    Ok(Json(DeleteSessionResponse { deleted_messages }))
}

/// GET /v1/sessions/:id/messages - oldest first
async fn get_messages(
    user: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<GetMessagesQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    tracing::info!("Getting messages of session {} for user {}", session_id, user.uid);
    load_session(&state, &user.uid, &session_id).await?;

    let messages = state
        .firestore
        .get_messages(&user.uid, &session_id, query.limit.clamp(1, MESSAGE_LIST_MAX))
        .await
        .map_err(|e| internal("Failed to get messages", e))?;

    Ok(Json(messages))
}

/// POST /v1/sessions/:id/messages - store the user's message and reply.
/// The reply comes from the completion API, or from the offline responder
/// when it is not configured or fails.
async fn send_message(
    user: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let text = request.text.trim();
    if text.is_empty() || text.chars().count() > MESSAGE_MAX_CHARS {
        return Err((StatusCode::BAD_REQUEST, "Message must be 1-4000 characters".to_string()));
    }

    let uid = &user.uid;
    let session = load_session(&state, uid, &session_id).await?;
    tracing::info!("Sending message in session {} for user {}", session_id, uid);

    let user_message = Message::human(text.to_string());
    let session = state
        .firestore
        .add_message(uid, &session, &user_message)
        .await
        .map_err(|e| internal("Failed to add user message", e))?;

    let history = match state.firestore.get_messages(uid, &session_id, HISTORY_WINDOW).await {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!("Failed to load history, replying without it: {}", e);
            vec![user_message.clone()]
        }
    };

    let translator = translator_for(&state, uid).await;

    let completion = if state.llm.is_configured() {
        let messages = build_messages(&system_prompt(&translator), &history, HISTORY_WINDOW);
        match state.llm.chat_response(&messages).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::warn!("Completion failed, using offline reply: {}", e);
                None
            }
        }
    } else {
        None
    };

    let fallback = completion.is_none();
    let reply_text = completion.unwrap_or_else(|| fallback::respond(text, &translator));

    let reply = Message::ai(reply_text);
    state
        .firestore
        .add_message(uid, &session, &reply)
        .await
        .map_err(|e| internal("Failed to add reply", e))?;

    Ok(Json(SendMessageResponse {
        user_message,
        reply,
        fallback,
    }))
}

/// GET /v1/sessions/stream - session list snapshots over SSE
async fn stream_sessions(user: AuthUser, State(state): State<AppState>) -> impl IntoResponse {
    tracing::info!("Subscribing to chat sessions of user {}", user.uid);

    let firestore = state.firestore.clone();
    let uid = user.uid;
    let subscription = watch(state.config.subscription_poll_interval, move || {
        let firestore = firestore.clone();
        let uid = uid.clone();
        async move { firestore.list_chat_sessions(&uid, SESSION_LIST_LIMIT).await }
    });

    sse_snapshots(subscription)
}

/// GET /v1/sessions/:id/messages/stream - message list snapshots over SSE
async fn stream_messages(
    user: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<GetMessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    load_session(&state, &user.uid, &session_id).await?;
    tracing::info!("Subscribing to session {} of user {}", session_id, user.uid);

    let firestore = state.firestore.clone();
    let uid = user.uid;
    let limit = query.limit.clamp(1, MESSAGE_LIST_MAX);
    let subscription = watch(state.config.subscription_poll_interval, move || {
        let firestore = firestore.clone();
        let uid = uid.clone();
        let session_id = session_id.clone();
        async move { firestore.get_messages(&uid, &session_id, limit).await }
    });

    Ok(sse_snapshots(subscription))
}

pub fn sessions_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", get(list_sessions).post(create_session))
        .route("/v1/sessions/stream", get(stream_sessions))
        .route("/v1/sessions/:id", patch(rename_session).delete(delete_session))
        .route("/v1/sessions/:id/messages", get(get_messages).post(send_message))
        .route("/v1/sessions/:id/messages/stream", get(stream_messages))
}
