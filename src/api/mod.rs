//! API layer
//!
//! HTTP handlers for:
//! - Posts and diary entries (through the Storage Facade)
//! - Profile and storage settings
//! - Backup export/import
//! - Metrics (Prometheus)

mod backup;
mod diary;
pub mod metrics;
mod posts;
mod profile;
mod settings;

use axum::Router;

use crate::AppState;

pub use metrics::metrics_router;
pub use settings::ModeResponse;

/// Journal API, nested under `/api`
pub fn journal_api_router() -> Router<AppState> {
    Router::new()
        .merge(posts::posts_router())
        .merge(diary::diary_router())
        .merge(profile::profile_router())
        .merge(settings::settings_router())
        .merge(backup::backup_router())
}
