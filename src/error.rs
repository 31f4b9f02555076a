use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Why a ranking table yielded no usable outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no row is flat since yesterday")]
    NotFound,

    #[error("pivot row is followed by fewer than two rows")]
    Truncated,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Markup parse error: {0}")]
    Parse(String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Persist error: {0}")]
    Persist(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Pipeline stage the error belongs to, for the run diagnostic.
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::Fetch(_) | AppError::Http(_) | AppError::Parse(_) => "fetch",
            AppError::Extraction(_) => "extract",
            AppError::Database(_) | AppError::Migration(_) | AppError::Persist(_) => "persist",
            AppError::Config(_) => "config",
            AppError::Io(_) | AppError::Image(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

impl From<image::ImageError> for AppError {
    fn from(e: image::ImageError) -> Self {
        AppError::Image(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let message = self.to_string();
        error!("{}: {message}", status.as_u16());
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
