//! Profile endpoints

use axum::{Router, extract::State, response::Json, routing::get};

use crate::AppState;
use crate::data::UserProfile;
use crate::error::AppError;

/// Routes:
/// - GET /api/profile - The stored profile, or null
/// - PUT /api/profile - Overwrite the profile
pub fn profile_router() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

/// GET /api/profile
async fn get_profile(
    State(state): State<AppState>,
) -> Result<Json<Option<UserProfile>>, AppError> {
    Ok(Json(state.journal.get_profile().await?))
}

/// PUT /api/profile
async fn update_profile(
    State(state): State<AppState>,
    Json(profile): Json<UserProfile>,
) -> Result<Json<UserProfile>, AppError> {
    if profile.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }

    state.journal.save_profile(&profile).await?;
    Ok(Json(profile))
}
