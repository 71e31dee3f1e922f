//! Error types for Yuyu
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.
//! Storage errors surface to the caller unmodified: nothing is retried and
//! nothing falls back from cloud to local.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Record not found (404)
    #[error("Document not found")]
    NotFound,

    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Cloud mode requested but the cloud configuration is incomplete (503)
    #[error("Cloud store not initialized: {0}")]
    CloudNotConfigured(String),

    /// Local database engine cannot be opened (503)
    #[error("Local storage engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Remote document/blob backend failed (502)
    #[error("Cloud backend error: {0}")]
    Transport(String),

    /// Import stopped partway; already-applied records stay applied (500)
    #[error("Import failed after {applied} of {total} records: {source}")]
    PartialImport {
        applied: usize,
        total: usize,
        #[source]
        source: Box<AppError>,
    },

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization error (500)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short machine-readable label, used for metrics and response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Validation(_) => "validation",
            AppError::CloudNotConfigured(_) => "cloud_not_configured",
            AppError::EngineUnavailable(_) => "engine_unavailable",
            AppError::Transport(_) => "transport",
            AppError::PartialImport { .. } => "partial_import",
            AppError::Database(_) => "database",
            AppError::HttpClient(_) => "http_client",
            AppError::Serialization(_) => "serialization",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body.
    fn into_response(self) -> Response {
        use axum::Json;

        let error_type = self.kind();
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::CloudNotConfigured(_) | AppError::EngineUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Transport(_) | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::PartialImport { .. }
            | AppError::Database(_)
            | AppError::Serialization(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            AppError::Database(_) => "Database error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[error_type])
            .inc();

        let mut body = serde_json::json!({
            "error": message,
            "type": error_type,
        });
        if let AppError::PartialImport { applied, total, .. } = &self {
            body["applied"] = serde_json::json!(applied);
            body["total"] = serde_json::json!(total);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
