// Diary routes
// Endpoints: /v1/diary/*

use std::collections::BTreeSet;
use std::future::Future;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::auth::AuthUser;
use crate::encryption;
use crate::models::{
    current_streak, ActivityCategory, CreateDiaryEntryRequest, DiaryEntry, DiaryRangeQuery,
    MoodSummary, StatusResponse,
};
use crate::routes::track_activity;
use crate::AppState;

const NOTE_MAX_CHARS: usize = 5000;
const MAX_TAGS: usize = 10;
const SUMMARY_DEFAULT_DAYS: i64 = 30;
const SUMMARY_MAX_ENTRIES: usize = 1000;
const STREAK_WINDOW_DAYS: i64 = 60;

type ApiError = (StatusCode, String);

/// Today's date in the given IANA timezone (UTC when absent)
fn local_today(timezone: Option<&str>) -> Result<NaiveDate, ApiError> {
    let now = Utc::now();
    match timezone {
        None => Ok(now.date_naive()),
        Some(name) => {
            let tz: Tz = name
                .parse()
                .map_err(|_| (StatusCode::BAD_REQUEST, format!("Unknown timezone {}", name)))?;
            Ok(now.with_timezone(&tz).date_naive())
        }
    }
}

/// Trimmed, de-duplicated, lower-cased tags
fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, ApiError> {
    let mut seen = BTreeSet::new();
    let tags: Vec<String> = tags
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect();

    if tags.len() > MAX_TAGS {
        return Err((StatusCode::BAD_REQUEST, format!("At most {} tags", MAX_TAGS)));
    }
    Ok(tags)
}

fn seal_note(state: &AppState, uid: &str, note: &str) -> Result<String, ApiError> {
    match &state.config.diary_encryption_secret {
        Some(secret) => encryption::encrypt(note, uid, secret.as_bytes()).map_err(|e| {
            tracing::error!("Failed to encrypt diary note: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to store note".to_string())
        }),
        None => Ok(note.to_string()),
    }
}

fn open_note(state: &AppState, uid: &str, entry: &mut DiaryEntry) {
    if let Some(secret) = &state.config.diary_encryption_secret {
        entry.note = encryption::decrypt(&entry.note, uid, secret.as_bytes());
    }
}

async fn load_entries(
    state: &AppState,
    uid: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: usize,
) -> Result<Vec<DiaryEntry>, ApiError> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err((StatusCode::BAD_REQUEST, "from must not be after to".to_string()));
        }
    }

    let mut entries = state
        .firestore
        .list_diary_entries(uid, from, to, limit)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list diary entries: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    for entry in entries.iter_mut() {
        open_note(state, uid, entry);
    }
    Ok(entries)
}

/// POST /v1/diary
async fn create_entry(
    user: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateDiaryEntryRequest>,
) -> Result<(StatusCode, Json<DiaryEntry>), ApiError> {
    let note = request.note.trim().to_string();
    if note.chars().count() > NOTE_MAX_CHARS {
        return Err((StatusCode::BAD_REQUEST, format!("Note longer than {} characters", NOTE_MAX_CHARS)));
    }

    let entry = DiaryEntry {
        id: uuid::Uuid::new_v4().to_string(),
        mood: request.mood,
        note,
        tags: normalize_tags(request.tags)?,
        entry_date: local_today(request.timezone.as_deref())?,
        created_at: Utc::now(),
    };
    tracing::info!(
        "Creating diary entry for user {} (mood {}, {})",
        user.uid,
        entry.mood.value(),
        entry.entry_date
    );

    let stored = DiaryEntry {
        note: seal_note(&state, &user.uid, &entry.note)?,
        ..entry.clone()
    };
    state
        .firestore
        .create_diary_entry(&user.uid, &stored)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create diary entry: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    track_activity(&state, &user.uid, ActivityCategory::Diary, None).await;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /v1/diary - newest first, optional date range
async fn list_entries(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DiaryRangeQuery>,
) -> Result<Json<Vec<DiaryEntry>>, ApiError> {
    tracing::info!("Listing diary entries for user {}", user.uid);
    let entries = load_entries(&state, &user.uid, query.from, query.to, query.limit.clamp(1, 500)).await?;
    Ok(Json(entries))
}

/// Walk back from `today` one window at a time, collecting the days that have
/// entries, until the streak stops before the start of a window.
async fn streak_from_history<F, Fut>(
    today: NaiveDate,
    window_days: i64,
    mut days_in: F,
) -> Result<u32, ApiError>
where
    F: FnMut(NaiveDate, NaiveDate) -> Fut,
    Fut: Future<Output = Result<Vec<NaiveDate>, ApiError>>,
{
    let mut days = BTreeSet::new();
    let mut window_end = today;

    loop {
        let window_start = window_end - Duration::days(window_days - 1);
        days.extend(days_in(window_start, window_end).await?);

        let streak = current_streak(&days, today);
        let reaches_window_start =
            days.contains(&window_start) && streak as i64 >= (today - window_start).num_days();
        if !reaches_window_start {
            return Ok(streak);
        }
        window_end = window_start - Duration::days(1);
    }
}

/// GET /v1/diary/summary - mood statistics, last 30 days by default
async fn mood_summary(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<DiaryRangeQuery>,
) -> Result<Json<MoodSummary>, ApiError> {
    let today = local_today(query.timezone.as_deref())?;
    let to = query.to.unwrap_or(today);
    let from = query
        .from
        .unwrap_or_else(|| to - Duration::days(SUMMARY_DEFAULT_DAYS - 1));

    tracing::info!("Mood summary for user {} ({} - {})", user.uid, from, to);
    let entries = load_entries(&state, &user.uid, Some(from), Some(to), SUMMARY_MAX_ENTRIES).await?;

    let streak = streak_from_history(today, STREAK_WINDOW_DAYS, |start, end| {
        let state = &state;
        let uid = user.uid.as_str();
        async move {
            let window = load_entries(state, uid, Some(start), Some(end), SUMMARY_MAX_ENTRIES).await?;
            Ok::<_, ApiError>(window.into_iter().map(|e| e.entry_date).collect::<Vec<_>>())
        }
    })
    .await?;

    Ok(Json(MoodSummary::from_entries(&entries, streak)))
}

/// DELETE /v1/diary/:id
async fn delete_entry(
    user: AuthUser,
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let existing = state
        .firestore
        .get_diary_entry(&user.uid, &entry_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get diary entry: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    if existing.is_none() {
        return Err((StatusCode::NOT_FOUND, "Entry not found".to_string()));
    }

    state
        .firestore
        .delete_diary_entry(&user.uid, &entry_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete diary entry: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

pub fn diary_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/diary", get(list_entries).post(create_entry))
        .route("/v1/diary/summary", get(mood_summary))
        .route("/v1/diary/:id", delete(delete_entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_today_rejects_unknown_timezone() {
        assert!(local_today(None).is_ok());
        assert!(local_today(Some("Europe/Madrid")).is_ok());
        assert_eq!(local_today(Some("Mars/Olympus")).unwrap_err().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_local_today_is_within_a_day_of_utc() {
        let utc = Utc::now().date_naive();
        for tz in ["Pacific/Kiritimati", "Pacific/Pago_Pago", "Asia/Kolkata"] {
            let local = local_today(Some(tz)).unwrap();
            assert!((local - utc).num_days().abs() <= 1, "{}", tz);
        }
    }

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(vec![
            " Work ".to_string(),
            "work".to_string(),
            "".to_string(),
            "Family".to_string(),
        ])
        .unwrap();
        assert_eq!(tags, vec!["work", "family"]);

        let too_many = (0..11).map(|i| format!("t{}", i)).collect();
        assert!(normalize_tags(too_many).is_err());
    }

    fn history(today: NaiveDate, offsets: impl Iterator<Item = i64>) -> BTreeSet<NaiveDate> {
        offsets.map(|d| today - Duration::days(d)).collect()
    }

    async fn streak_over(history: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
        streak_from_history(today, 30, |start, end| {
            let days: Vec<NaiveDate> = history.range(start..=end).copied().collect();
            async move { Ok::<_, ApiError>(days) }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_streak_spans_several_windows() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        assert_eq!(streak_over(&history(today, 0..45), today).await, 45);
        // Ends exactly on a window boundary
        assert_eq!(streak_over(&history(today, 0..60), today).await, 60);
        // Starting yesterday
        assert_eq!(streak_over(&history(today, 1..40), today).await, 39);
    }

    #[tokio::test]
    async fn test_streak_stops_at_first_gap() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let days = history(today, (0..5).chain(6..50));
        assert_eq!(streak_over(&days, today).await, 5);
        assert_eq!(streak_over(&BTreeSet::new(), today).await, 0);
    }
}
