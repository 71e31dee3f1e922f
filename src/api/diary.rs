//! Diary endpoints

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
};
use serde::Deserialize;

use crate::AppState;
use crate::data::DiaryEntry;
use crate::error::AppError;

/// Create/update request body
#[derive(Debug, Deserialize)]
pub struct DiaryEntryRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Routes:
/// - GET /api/diary - All entries, newest first
/// - POST /api/diary - Create an entry
/// - PUT /api/diary/:id - Update title and content
/// - DELETE /api/diary/:id - Delete an entry
pub fn diary_router() -> Router<AppState> {
    Router::new()
        .route("/diary", get(list_entries).post(create_entry))
        .route("/diary/:id", put(update_entry).delete(delete_entry))
}

/// GET /api/diary
async fn list_entries(State(state): State<AppState>) -> Result<Json<Vec<DiaryEntry>>, AppError> {
    Ok(Json(state.journal.get_diary_entries().await?))
}

/// POST /api/diary
async fn create_entry(
    State(state): State<AppState>,
    Json(req): Json<DiaryEntryRequest>,
) -> Result<(StatusCode, Json<DiaryEntry>), AppError> {
    let entry = DiaryEntry::new(req.title, req.content);
    state.journal.save_diary_entry(&entry).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /api/diary/:id
///
/// Keeps the creation date and refreshes `updatedAt`.
async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DiaryEntryRequest>,
) -> Result<Json<DiaryEntry>, AppError> {
    let mut entry = state
        .journal
        .get_diary_entries()
        .await?
        .into_iter()
        .find(|entry| entry.id == id)
        .ok_or(AppError::NotFound)?;

    entry.revise(req.title, req.content);
    state.journal.save_diary_entry(&entry).await?;

    Ok(Json(entry))
}

/// DELETE /api/diary/:id
async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.journal.delete_diary_entry(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
