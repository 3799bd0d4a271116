//! # Centralized Error Handling
//!
//! [`AppError`] is the error type shared by the settings, the connection
//! manager and the repositories.
//!
//! ## Error Categories
//!
//! 1. **Configuration** - [`Config`](AppError::Config): fatal at startup, the
//!    process must not start serving.
//! 2. **Initialization order** - [`NotInitialized`](AppError::NotInitialized):
//!    a session or schema call before `setup()`; surfaced to the request that
//!    triggered it.
//! 3. **Database** - [`Database`](AppError::Database): engine unreachable or a
//!    statement failed; surfaced to the caller of that operation.
//! 4. **Client** - [`InvalidInput`](AppError::InvalidInput) → 400,
//!    [`NotFound`](AppError::NotFound) → 404.
//!
//! Nothing here retries; retry policy belongs to the database client.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid or missing configuration.
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The connection manager was used before `setup()` (or after `teardown()`).
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Not initialized: {0}")]
    NotInitialized(&'static str),

    /// Database driver error (connectivity, constraint, statement).
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid user input validation error.
    ///
    /// **HTTP Status**: 400 Bad Request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested resource not found.
    ///
    /// **HTTP Status**: 404 Not Found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error (unexpected failures).
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::NotInitialized(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-facing error message.
    ///
    /// Server-side failures get a generic message; details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::Config(_)
            | AppError::NotInitialized(_)
            | AppError::Database(_)
            | AppError::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    /// True when the error came from a unique-constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, AppError::Database(msg) if msg.starts_with(UNIQUE_VIOLATION_PREFIX))
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Config",
            AppError::NotInitialized(_) => "NotInitialized",
            AppError::Database(_) => "Database",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Internal(_) => "Internal",
        }
    }
}

const UNIQUE_VIOLATION_PREFIX: &str = "unique violation: ";

/// Implement Axum's `IntoResponse` for automatic error handling.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Server error: {}", self);
        } else {
            tracing::debug!("Client error: {}", self);
        }

        let body = Json(json!({
            "detail": self.user_message(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

/// Convert `sqlx::Error` to `AppError`.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Database record not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Database(format!("{UNIQUE_VIOLATION_PREFIX}{}", db_err.message()))
            }
            sqlx::Error::Database(db_err) => AppError::Database(db_err.message().to_string()),
            _ => AppError::Database(err.to_string()),
        }
    }
}

/// Convert env parsing errors to `AppError`.
impl From<lib_utils::envs::Error> for AppError {
    fn from(err: lib_utils::envs::Error) -> Self {
        match err {
            lib_utils::envs::Error::MissingEnv(name) => {
                AppError::Config(format!("{name} must be set in environment"))
            }
            lib_utils::envs::Error::WrongFormat(name) => {
                AppError::Config(format!("{name} has an invalid value"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::InvalidInput("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::NotInitialized("session").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AppError::Database("password authentication failed for user".into());
        assert_eq!(err.user_message(), "An internal error occurred");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(AppError::from(sqlx::Error::RowNotFound), AppError::NotFound(_)));
    }

    #[test]
    fn test_env_error_maps_to_config() {
        let err = AppError::from(lib_utils::envs::Error::WrongFormat("DB_PORT"));
        assert!(matches!(err, AppError::Config(msg) if msg.contains("DB_PORT")));
    }
}
