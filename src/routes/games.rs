// Game routes
// Endpoints: /v1/games/:game/*

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::auth::AuthUser;
use crate::models::{
    ActivityCategory, AutoRouteRequest, AutoRouteResponse, CompleteLevelRequest, GameKind,
    GameProgress, ProgressError, ValidatePathRequest, ValidatePathResponse,
};
use crate::puzzle::{levels, Board, Cell, Level};
use crate::routes::track_activity;
use crate::AppState;

type ApiError = (StatusCode, String);

fn parse_game(game: &str) -> Result<GameKind, ApiError> {
    GameKind::parse(game).ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown game {}", game)))
}

/// Level definitions only exist for the dot-connecting game
fn connect_dots_level(game: &str, number: u32) -> Result<Level, ApiError> {
    if parse_game(game)? != GameKind::ConnectDots {
        return Err((StatusCode::NOT_FOUND, format!("{} has no level definitions", game)));
    }
    levels::level(number).ok_or_else(|| (StatusCode::NOT_FOUND, format!("No level {}", number)))
}

/// Rebuild a board from the client's committed paths, checking each one
fn restore_board(level: Level, committed: BTreeMap<String, Vec<Cell>>) -> Result<Board, ApiError> {
    let mut board = Board::new(level);
    for (color, path) in committed {
        board
            .commit(&color, path)
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("committed {} path: {}", color, e)))?;
    }
    Ok(board)
}

/// GET /v1/games/:game/progress
async fn get_progress(
    user: AuthUser,
    State(state): State<AppState>,
    Path(game): Path<String>,
) -> Result<Json<GameProgress>, ApiError> {
    let game = parse_game(&game)?;
    tracing::info!("Getting {} progress for user {}", game.as_str(), user.uid);

    state
        .firestore
        .get_game_progress(&user.uid, game)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to get game progress: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
}

/// POST /v1/games/:game/levels/:level/complete
async fn complete_level(
    user: AuthUser,
    State(state): State<AppState>,
    Path((game, level)): Path<(String, u32)>,
    request: Option<Json<CompleteLevelRequest>>,
) -> Result<Json<GameProgress>, ApiError> {
    let game = parse_game(&game)?;
    if game == GameKind::ConnectDots && level > levels::level_count() {
        return Err((StatusCode::NOT_FOUND, format!("No level {}", level)));
    }
    let request = request.map(|Json(r)| r).unwrap_or_default();

    tracing::info!(
        "User {} completed {} level {} (moves {:?}, time {:?}ms)",
        user.uid,
        game.as_str(),
        level,
        request.moves,
        request.time_ms
    );

    let mut progress = state
        .firestore
        .get_game_progress(&user.uid, game)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get game progress: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    progress
        .complete_level(level, request.moves, request.time_ms)
        .map_err(|e| match e {
            ProgressError::InvalidLevel => (StatusCode::BAD_REQUEST, e.to_string()),
            ProgressError::LevelLocked { .. } => (StatusCode::CONFLICT, e.to_string()),
        })?;

    state
        .firestore
        .save_game_progress(&user.uid, game, &progress)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save game progress: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    track_activity(&state, &user.uid, ActivityCategory::Game, None).await;

    Ok(Json(progress))
}

/// GET /v1/games/connect_dots/levels/:level
async fn get_level(Path((game, level)): Path<(String, u32)>) -> Result<Json<Level>, ApiError> {
    connect_dots_level(&game, level).map(Json)
}

/// POST /v1/games/connect_dots/levels/:level/validate
async fn validate_path(
    Path((game, level)): Path<(String, u32)>,
    Json(request): Json<ValidatePathRequest>,
) -> Result<Json<ValidatePathResponse>, ApiError> {
    let level = connect_dots_level(&game, level)?;
    let mut board = restore_board(level, request.committed)?;

    let response = match board.commit(&request.color, request.path) {
        Ok(()) => ValidatePathResponse {
            valid: true,
            reason: None,
            complete: board.is_complete(),
        },
        Err(e) => ValidatePathResponse {
            valid: false,
            reason: Some(e.to_string()),
            complete: false,
        },
    };

    Ok(Json(response))
}

/// POST /v1/games/connect_dots/levels/:level/route
async fn auto_route(
    Path((game, level)): Path<(String, u32)>,
    Json(request): Json<AutoRouteRequest>,
) -> Result<Json<AutoRouteResponse>, ApiError> {
    let level = connect_dots_level(&game, level)?;
    if level.pair(&request.color).is_none() {
        return Err((StatusCode::BAD_REQUEST, format!("unknown color {}", request.color)));
    }

    // Clicking a color discards the path it had
    let mut board = restore_board(level, request.committed)?;
    board.remove(&request.color);
    Ok(Json(AutoRouteResponse {
        path: board.auto_route(&request.color),
    }))
}

pub fn games_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/games/:game/progress", get(get_progress))
        .route("/v1/games/:game/levels/:level", get(get_level))
        .route("/v1/games/:game/levels/:level/complete", post(complete_level))
        .route("/v1/games/:game/levels/:level/validate", post(validate_path))
        .route("/v1/games/:game/levels/:level/route", post(auto_route))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_only_for_connect_dots() {
        assert!(connect_dots_level("connect_dots", 1).is_ok());
        assert_eq!(connect_dots_level("memory_match", 1).unwrap_err().0, StatusCode::NOT_FOUND);
        assert_eq!(connect_dots_level("chess", 1).unwrap_err().0, StatusCode::NOT_FOUND);
        assert_eq!(connect_dots_level("connect_dots", 0).unwrap_err().0, StatusCode::NOT_FOUND);
        assert!(connect_dots_level("connect_dots", levels::level_count() + 1).is_err());
    }

    #[test]
    fn test_restore_board_rejects_invalid_committed_path() {
        let level = levels::level(1).unwrap();
        let pair = level.pairs[0].clone();
        let mut committed = BTreeMap::new();
        committed.insert(pair.color.clone(), vec![pair.start]);

        let err = restore_board(level, committed).unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_restore_board_accepts_routed_paths() {
        let level = levels::level(1).unwrap();
        let board = Board::new(level.clone());
        let color = level.pairs[0].color.clone();
        if let Some(path) = board.auto_route(&color) {
            let mut committed = BTreeMap::new();
            committed.insert(color.clone(), path);
            let restored = restore_board(level, committed).unwrap();
            assert!(restored.paths.contains_key(&color));
        }
    }
}
