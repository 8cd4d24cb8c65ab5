// Configuration - Environment variables

use std::env;
use std::time::Duration;

use crate::llm::client::DEFAULT_BASE_URL;

/// Application configuration loaded from environment
#[derive(Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Google Application Credentials path for Firestore
    pub google_application_credentials: Option<String>,
    /// Firebase project ID
    pub firebase_project_id: Option<String>,
    /// Chat completion API key; without it chat uses the offline responder
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    /// Places API key for the therapist finder
    pub google_maps_api_key: Option<String>,
    /// Master secret for diary note encryption
    pub diary_encryption_secret: Option<String>,
    /// Locale used when a user has not picked one
    pub default_locale: String,
    /// How often SSE subscriptions poll Firestore
    pub subscription_poll_interval: Duration,
    pub log_file: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            google_application_credentials: env::var("GOOGLE_APPLICATION_CREDENTIALS").ok(),
            firebase_project_id: env::var("FIREBASE_PROJECT_ID").ok()
                .or_else(|| env::var("GCP_PROJECT_ID").ok()),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            openai_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY").ok().filter(|k| !k.is_empty()),
            diary_encryption_secret: env::var("DIARY_ENCRYPTION_SECRET").ok().filter(|s| !s.is_empty()),
            default_locale: env::var("DEFAULT_LOCALE").unwrap_or_else(|_| "en".to_string()),
            subscription_poll_interval: Duration::from_secs(
                env::var("SUBSCRIPTION_POLL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|s: &u64| *s > 0)
                    .unwrap_or(3),
            ),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "/tmp/mindful.log".to_string()),
        }
    }

    /// Validate that required configuration is present
    pub fn validate(&self) -> Result<(), String> {
        if self.firebase_project_id.is_none() {
            return Err("FIREBASE_PROJECT_ID (or GCP_PROJECT_ID) must be set".to_string());
        }
        if self.google_application_credentials.is_none() {
            tracing::warn!("GOOGLE_APPLICATION_CREDENTIALS not set - Firestore will use default credentials");
        }
        if self.openai_api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY not set - chat will use offline replies");
        }
        if self.google_maps_api_key.is_none() {
            tracing::warn!("GOOGLE_MAPS_API_KEY not set - therapist search disabled");
        }
        if self.diary_encryption_secret.is_none() {
            tracing::warn!("DIARY_ENCRYPTION_SECRET not set - diary notes stored unencrypted");
        }
        Ok(())
    }
}
