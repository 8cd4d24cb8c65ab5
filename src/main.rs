// Mindful Backend - Rust
// API for the wellness app: chat, diary, assessments, games, sounds, therapist finder

use axum::Router;
use std::fs::OpenOptions;
use std::io::LineWriter;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Custom time formatter: [HH:mm:ss] [backend]
#[derive(Clone)]
struct BackendTimer;

impl FormatTime for BackendTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(w, "[{}] [backend]", now.format("%H:%M:%S"))
    }
}

mod assessments;
mod auth;
mod config;
mod encryption;
mod i18n;
mod llm;
mod models;
mod puzzle;
mod routes;
mod services;

use auth::{firebase_auth_extension, FirebaseAuth};
use config::Config;
use i18n::Locales;
use llm::LlmClient;
use routes::{
    assessments_routes, diary_routes, games_routes, health_routes, locales_routes,
    sessions_routes, sounds_routes, therapists_routes, users_routes,
};
use services::{FirestoreService, PlacesService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub firestore: Arc<FirestoreService>,
    pub places: Arc<PlacesService>,
    pub llm: Arc<LlmClient>,
    pub locales: Arc<Locales>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() {
    // Load environment variables (LOG_FILE is read below)
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Log file is optional; stdout logging works without it
    let file_writer = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
    {
        Ok(file) => Some(tracing_appender::non_blocking(LineWriter::new(file))),
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", config.log_file, e);
            None
        }
    };
    let (file_writer, _guard) = match file_writer {
        Some((writer, guard)) => (Some(writer), Some(guard)),
        None => (None, None),
    };

    // Format: [HH:mm:ss] [backend] message
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindful_backend=info,tower_http=info".into()),
        )
        // Stdout layer
        .with(
            fmt::layer()
                .with_timer(BackendTimer)
                .with_target(false)
                .with_level(false)
                .with_ansi(true),
        )
        // File layer (same format, no ANSI colors)
        .with(file_writer.map(|writer| {
            fmt::layer()
                .with_timer(BackendTimer)
                .with_target(false)
                .with_level(false)
                .with_ansi(false)
                .with_writer(writer)
        }))
        .init();

    if let Err(e) = config.validate() {
        tracing::error!("Configuration error: {}", e);
        std::process::exit(1);
    }
    let project_id = config.firebase_project_id.clone().unwrap_or_default();

    // Initialize Firebase Auth
    let firebase_auth = Arc::new(FirebaseAuth::new(project_id.clone()));
    if let Err(e) = firebase_auth.refresh_keys().await {
        tracing::warn!("Failed to fetch Firebase keys: {} - will retry on first request", e);
    }

    // Initialize Firestore
    let firestore = match FirestoreService::new(project_id).await {
        Ok(fs) => Arc::new(fs),
        Err(e) => {
            tracing::error!("Failed to initialize Firestore: {}", e);
            std::process::exit(1);
        }
    };

    let locales = match Locales::bundled(&config.default_locale) {
        Ok(locales) => Arc::new(locales),
        Err(e) => {
            tracing::error!("Failed to load bundled locales: {}", e);
            std::process::exit(1);
        }
    };

    let llm = Arc::new(LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.openai_model.clone(),
    ));
    let places = Arc::new(PlacesService::new(config.google_maps_api_key.clone()));

    // Create app state
    let state = AppState {
        firestore,
        places,
        llm,
        locales,
        config: Arc::new(config.clone()),
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(health_routes())
        .merge(users_routes())
        .merge(locales_routes())
        .merge(sessions_routes())
        .merge(assessments_routes())
        .merge(games_routes())
        .merge(diary_routes())
        .merge(sounds_routes())
        .merge(therapists_routes())
        .with_state(state)
        .layer(firebase_auth_extension(firebase_auth))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting Mindful Backend on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
