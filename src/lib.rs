//! Yuyu - a personal photo journal with local-first storage
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Posts, diary, profile                                    │
//! │  - Storage settings, backup export/import                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Storage Facade (routes each call to local or cloud)      │
//! │  - Backup/Restore                                           │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                         │
//! ┌───────────────────────────┐ ┌───────────────────────────────┐
//! │  Local Store (SQLite)     │ │  Cloud Store (Firestore REST  │
//! │                           │ │  + Firebase Storage blobs)    │
//! └───────────────────────────┘ └───────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Storage Facade and Backup/Restore
//! - `storage`: store strategies and the cloud connector
//! - `data`: models, timestamps and the SQLite Local Store
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus metrics

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;
pub mod storage;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// shared resources like the database pool and services.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Local Store (SQLite)
    pub db: Arc<data::Database>,

    /// Storage Facade
    pub journal: Arc<service::JournalService>,

    /// Backup/Restore
    pub backup: Arc<service::BackupService>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Open (or create) the SQLite database and apply migrations
    /// 2. Build the Firebase connector
    /// 3. Load the storage context from the stored cloud configuration
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = Arc::new(data::Database::connect(&config.database.path).await?);
        tracing::info!(path = %config.database.path.display(), "Database connected");

        // 2. Cloud connector (only used once a cloud configuration exists)
        let connector = Arc::new(storage::FirebaseConnector::new(config.cloud.clone())?);

        // 3. Storage Facade and Backup/Restore
        let journal = Arc::new(service::JournalService::load(db.clone(), connector).await?);
        let backup = Arc::new(service::BackupService::new(journal.clone()));

        let mode = journal.mode().await;
        tracing::info!(
            mode = mode.as_str(),
            "Application state initialized successfully"
        );

        Ok(Self {
            config: Arc::new(config),
            db,
            journal,
            backup,
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use axum::extract::DefaultBodyLimit;
    use tower_http::{
        compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
        trace::TraceLayer,
    };

    let body_limit = state.config.upload.max_backup_bytes;

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::journal_api_router())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}
