//! ScamGuard API Server

mod auth;
mod db;
mod error;
mod media;
mod ocr;
mod routes;

use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scamguard_core::adapters::{
    GenerativeClassifier, GenerativeConfig, PhoneReputationClient, ReputationConfig,
    UrlReputationClient,
};
use scamguard_core::analytics::AnalyticsConfig;
use scamguard_core::{DetectionPipeline, HistoryStore, Thresholds, WatchlistStore};

use db::{PgHistory, PgUsers, PgWatchlist, UserStore};
use media::MediaClient;
use ocr::OcrClient;

/// Application state shared across handlers. The stores are the same
/// instances the pipeline holds.
pub struct AppState {
    pub db: sqlx::PgPool,
    pub pipeline: DetectionPipeline,
    pub watchlist: Arc<dyn WatchlistStore>,
    pub history: Arc<dyn HistoryStore>,
    pub users: Arc<dyn UserStore>,
    pub ocr: OcrClient,
    pub media: MediaClient,
    pub config: AppConfig,
}

/// Application configuration, read from the environment once at startup
/// and injected everywhere else.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub classifier_endpoint: String,
    pub classifier_api_key: String,
    pub reputation_base_url: String,
    pub reputation_api_key: String,
    pub ocr_endpoint: String,
    pub media_endpoint: String,
    pub upstream_timeout_secs: u64,
    pub thresholds: Thresholds,
    pub analytics: AnalyticsConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let env = |key: &str, default: &str| {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };

        Self {
            database_url: env("DATABASE_URL", "postgres://localhost/scamguard"),
            bind_addr: env("BIND_ADDR", "0.0.0.0:3000"),
            access_token_secret: env(
                "ACCESS_TOKEN_SECRET",
                "development-secret-change-in-production",
            ),
            refresh_token_secret: env(
                "REFRESH_TOKEN_SECRET",
                "development-refresh-secret-change-in-production",
            ),
            classifier_endpoint: env(
                "CLASSIFIER_ENDPOINT",
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent",
            ),
            classifier_api_key: env("CLASSIFIER_API_KEY", ""),
            reputation_base_url: env(
                "REPUTATION_BASE_URL",
                "https://ipqualityscore.com/api/json",
            ),
            reputation_api_key: env("REPUTATION_API_KEY", ""),
            ocr_endpoint: env("OCR_ENDPOINT", "http://localhost:8600/recognize"),
            media_endpoint: env("MEDIA_ENDPOINT", "http://localhost:8700/upload"),
            upstream_timeout_secs: env("UPSTREAM_TIMEOUT_SECS", "30")
                .parse()
                .unwrap_or(30),
            thresholds: Thresholds::default(),
            analytics: AnalyticsConfig::default(),
        }
    }
}

fn build_pipeline(
    config: &AppConfig,
    watchlist: Arc<dyn WatchlistStore>,
    history: Arc<dyn HistoryStore>,
) -> DetectionPipeline {
    let text_adapter = GenerativeClassifier::new(GenerativeConfig {
        endpoint: config.classifier_endpoint.clone(),
        api_key: config.classifier_api_key.clone(),
        timeout_secs: config.upstream_timeout_secs,
    });
    let url_adapter = UrlReputationClient::new(ReputationConfig {
        base_url: config.reputation_base_url.clone(),
        api_key: config.reputation_api_key.clone(),
        timeout_secs: config.upstream_timeout_secs,
    });
    let phone_adapter = PhoneReputationClient::new(ReputationConfig {
        base_url: config.reputation_base_url.clone(),
        api_key: config.reputation_api_key.clone(),
        timeout_secs: config.upstream_timeout_secs,
    });

    DetectionPipeline::new(
        Box::new(text_adapter),
        Box::new(url_adapter),
        Box::new(phone_adapter),
        watchlist,
        history,
        config.thresholds.clone(),
    )
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "scamguard_api=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ScamGuard API Server");

    let config = AppConfig::from_env();

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run migrations");

    info!("Database migrations complete");

    let watchlist: Arc<dyn WatchlistStore> = Arc::new(PgWatchlist::new(db.clone()));
    let history: Arc<dyn HistoryStore> = Arc::new(PgHistory::new(db.clone()));
    let users: Arc<dyn UserStore> = Arc::new(PgUsers::new(db.clone()));
    let pipeline = build_pipeline(&config, watchlist.clone(), history.clone());
    let bind_addr = config.bind_addr.clone();

    let state = Arc::new(AppState {
        pipeline,
        watchlist,
        history,
        users,
        ocr: OcrClient::new(config.ocr_endpoint.clone(), config.upstream_timeout_secs),
        media: MediaClient::new(config.media_endpoint.clone(), config.upstream_timeout_secs),
        db,
        config,
    });

    let app = Router::new()
        // Health check
        .route("/health", get(routes::health_check))

        // Authentication
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/refresh", post(routes::auth::refresh))
        .route("/api/auth/logout", post(routes::auth::logout))

        // Profile
        .route("/api/users/me", get(routes::users::get_profile))
        .route("/api/users/me", patch(routes::users::update_profile))
        .route("/api/users/me", delete(routes::users::delete_account))

        // Detection
        .route("/api/scam/check-text", post(routes::detect::check_text))
        .route("/api/scam/check-image", post(routes::detect::check_image))
        .route("/api/scam/check-url", post(routes::detect::check_url))
        .route("/api/scam/check-phone", post(routes::detect::check_phone))
        .route("/api/scam/history", get(routes::detect::get_history))
        .route("/api/scam/analytics", get(routes::detect::get_analytics))

        // Scam advisories (public)
        .route("/api/scam/update", post(routes::updates::add_update))
        .route("/api/scam/updates", get(routes::updates::list_updates))
        .route("/api/scam/update/:id", delete(routes::updates::delete_update))

        // Watchlist
        .route("/api/scam/watchlist", post(routes::watchlist::add_entry))
        .route("/api/scam/watchlist", get(routes::watchlist::list))
        .route("/api/scam/watchlist/:id", delete(routes::watchlist::delete_entry))
        .route("/api/scam/watchlist/report", post(routes::watchlist::report))

        // CORS
        .layer(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any))

        // Tracing
        .layer(TraceLayer::new_for_http())

        // A panicking handler still answers with a 500
        .layer(CatchPanicLayer::new())

        // State
        .with_state(state);

    info!("Listening on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
