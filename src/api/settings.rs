//! Storage settings endpoints
//!
//! Saving a cloud configuration switches the facade to cloud mode on the
//! next call; clearing it switches back to local. Data already written is
//! not moved between stores.

use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;

use crate::AppState;
use crate::data::CloudConfig;
use crate::error::AppError;
use crate::storage::StoreMode;

/// Current routing state
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeResponse {
    pub mode: StoreMode,
    /// Required cloud fields that are blank (cloud calls fail until filled in)
    pub missing_fields: Vec<&'static str>,
}

impl ModeResponse {
    fn from_config(config: Option<&CloudConfig>) -> Self {
        match config {
            Some(config) => Self {
                mode: StoreMode::Cloud,
                missing_fields: config.missing_fields(),
            },
            None => Self {
                mode: StoreMode::Local,
                missing_fields: Vec::new(),
            },
        }
    }
}

/// Routes:
/// - GET /api/settings/cloud - Stored cloud configuration, or null
/// - PUT /api/settings/cloud - Save configuration (switches to cloud mode)
/// - DELETE /api/settings/cloud - Remove configuration (switches to local mode)
/// - POST /api/settings/cloud/reload - Re-read the stored configuration
/// - GET /api/settings/mode - Current mode
pub fn settings_router() -> Router<AppState> {
    Router::new()
        .route(
            "/settings/cloud",
            get(get_cloud_config)
                .put(save_cloud_config)
                .delete(clear_cloud_config),
        )
        .route("/settings/cloud/reload", post(reload_cloud_config))
        .route("/settings/mode", get(get_mode))
}

/// GET /api/settings/cloud
async fn get_cloud_config(State(state): State<AppState>) -> Json<Option<CloudConfig>> {
    Json(state.journal.cloud_config().await)
}

/// PUT /api/settings/cloud
async fn save_cloud_config(
    State(state): State<AppState>,
    Json(config): Json<CloudConfig>,
) -> Result<Json<ModeResponse>, AppError> {
    let response = ModeResponse::from_config(Some(&config));
    state.journal.save_cloud_config(config).await?;
    Ok(Json(response))
}

/// DELETE /api/settings/cloud
async fn clear_cloud_config(State(state): State<AppState>) -> Result<Json<ModeResponse>, AppError> {
    state.journal.clear_cloud_config().await?;
    Ok(Json(ModeResponse::from_config(None)))
}

/// POST /api/settings/cloud/reload
async fn reload_cloud_config(
    State(state): State<AppState>,
) -> Result<Json<ModeResponse>, AppError> {
    state.journal.reload_config().await?;
    let config = state.journal.cloud_config().await;
    Ok(Json(ModeResponse::from_config(config.as_ref())))
}

/// GET /api/settings/mode
async fn get_mode(State(state): State<AppState>) -> Json<ModeResponse> {
    let config = state.journal.cloud_config().await;
    Json(ModeResponse::from_config(config.as_ref()))
}
