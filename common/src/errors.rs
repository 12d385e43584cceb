//! Application error types.
//!
//! Every fallible path in the service surfaces one of these variants; the
//! `IntoResponse` impl turns them into the unified API envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::response::ApiResponse;

/// Convenience alias for results carrying an [`AppError`].
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request body failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The database could not be reached or refused the credentials.
    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    /// A query was accepted but failed to execute.
    #[error("database query failed: {0}")]
    DatabaseQuery(String),

    /// The SQL guard rejected a statement.
    #[error("unsafe SQL rejected: {0}")]
    UnsafeSql(String),

    /// No session exists under the given id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The LLM provider returned an error or could not be reached.
    #[error("LLM request failed: {0}")]
    LlmApi(String),

    /// The LLM provider rate-limited the request.
    #[error("LLM rate limited")]
    RateLimited,

    /// The agent failed outside of any single tool call.
    #[error("agent failed: {0}")]
    Agent(String),
}

impl AppError {
    /// Stable machine-readable error code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            AppError::DatabaseQuery(_) => "DATABASE_QUERY_ERROR",
            AppError::UnsafeSql(_) => "UNSAFE_SQL",
            AppError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            AppError::LlmApi(_) => "LLM_ERROR",
            AppError::RateLimited => "LLM_RATE_LIMITED",
            AppError::Agent(_) => "AGENT_ERROR",
        }
    }

    /// HTTP status the error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::UnsafeSql(_) => StatusCode::BAD_REQUEST,
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::DatabaseConnection(_) | AppError::LlmApi(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseQuery(_) | AppError::Agent(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiResponse::err(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}
