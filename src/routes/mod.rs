// Routes module

pub mod assessments;
pub mod diary;
pub mod games;
pub mod health;
pub mod locales;
pub mod sessions;
pub mod sounds;
pub mod therapists;
pub mod users;

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use chrono::Utc;
use futures::Stream;
use serde::Serialize;

use crate::i18n::Translator;
use crate::models::{ActivityCategory, RecentActivity};
use crate::services::Subscription;
use crate::AppState;

pub use assessments::assessments_routes;
pub use diary::diary_routes;
pub use games::games_routes;
pub use health::health_routes;
pub use locales::locales_routes;
pub use sessions::sessions_routes;
pub use sounds::sounds_routes;
pub use therapists::therapists_routes;
pub use users::users_routes;

/// Translator for the user's stored language, or the default locale
pub(crate) async fn translator_for(state: &AppState, uid: &str) -> Translator {
    let language = match state.firestore.get_or_create_user_profile(uid).await {
        Ok(profile) => profile.language,
        Err(e) => {
            tracing::warn!("Failed to load profile for user {}: {} - using default locale", uid, e);
            None
        }
    };
    state.locales.translator(language.as_deref())
}

/// Record an activity on the user's profile. Without a title the localized
/// category name is used. Failures are logged only, the triggering request
/// has already succeeded.
pub(crate) async fn track_activity(
    state: &AppState,
    uid: &str,
    category: ActivityCategory,
    title: Option<String>,
) {
    let result = async {
        let mut profile = state.firestore.get_or_create_user_profile(uid).await?;
        let title = title.unwrap_or_else(|| {
            state
                .locales
                .translator(profile.language.as_deref())
                .t(&format!("activities.{}", category.as_str()))
        });
        let unlocked = profile.record_activity(RecentActivity {
            category,
            title,
            at: Utc::now(),
        });
        state.firestore.save_user_profile(uid, &profile).await?;
        Ok::<_, Box<dyn std::error::Error + Send + Sync>>(unlocked)
    }
    .await;

    match result {
        Ok(unlocked) if !unlocked.is_empty() => {
            tracing::info!("User {} unlocked achievements: {:?}", uid, unlocked)
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("Failed to record {} activity for user {}: {}", category.as_str(), uid, e),
    }
}

/// Serve a subscription as Server-Sent Events; each snapshot is one
/// `snapshot` event carrying JSON. The subscription ends when the client
/// disconnects and the stream is dropped.
pub(crate) fn sse_snapshots<T>(
    subscription: Subscription<T>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: Serialize + Send + 'static,
{
    let events = async_stream::stream! {
        let mut subscription = subscription;
        while let Some(snapshot) = subscription.next_snapshot().await {
            match Event::default().event("snapshot").json_data(&snapshot) {
                Ok(event) => yield Ok::<_, Infallible>(event),
                Err(e) => {
                    tracing::error!("Failed to serialize snapshot, closing stream: {}", e);
                    break;
                }
            }
        }
        subscription.unsubscribe();
    };
    Sse::new(events).keep_alive(KeepAlive::default())
}
