//! Backup endpoints

use axum::{
    Router,
    extract::State,
    http::header,
    response::{IntoResponse, Json, Response},
    routing::get,
};

use crate::AppState;
use crate::data::BackupData;
use crate::error::AppError;
use crate::service::ImportReport;

/// Routes:
/// - GET /api/backup - Export everything as a downloadable JSON bundle
/// - POST /api/backup - Merge a bundle into the active store
pub fn backup_router() -> Router<AppState> {
    Router::new().route("/backup", get(export_backup).post(import_backup))
}

/// GET /api/backup
async fn export_backup(State(state): State<AppState>) -> Result<Response, AppError> {
    let bundle = state.backup.export_all().await?;
    let file_name = format!(
        "yuyu-backup-{}.json",
        chrono::Utc::now().format("%Y-%m-%d")
    );

    Ok((
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )],
        Json(bundle),
    )
        .into_response())
}

/// POST /api/backup
async fn import_backup(
    State(state): State<AppState>,
    Json(bundle): Json<BackupData>,
) -> Result<Json<ImportReport>, AppError> {
    Ok(Json(state.backup.import_all(bundle).await?))
}
