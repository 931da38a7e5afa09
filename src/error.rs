use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The recommendation pipeline ended in its error state
    #[error("{0}")]
    Pipeline(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Pipeline(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Cache(_)
            | AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Failure of a single pipeline stage
///
/// Stages never panic or propagate past their node; the node records
/// the error on the request state and the orchestrator stops advancing.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageErrorKind {
    MissingPrerequisite,
    EmptyInput,
    UnknownStep,
    InvalidInput,
}

impl StageError {
    pub fn kind(&self) -> StageErrorKind {
        match self {
            StageError::MissingPrerequisite(_) => StageErrorKind::MissingPrerequisite,
            StageError::EmptyInput(_) => StageErrorKind::EmptyInput,
            StageError::UnknownStep(_) => StageErrorKind::UnknownStep,
            StageError::InvalidInput(_) => StageErrorKind::InvalidInput,
        }
    }
}

/// Errors raised while loading process-wide configuration files
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Configuration missing: {0}")]
    Missing(String),

    #[error("Configuration unreadable: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("Configuration invalid: {0}")]
    Invalid(#[from] serde_json::Error),
}
