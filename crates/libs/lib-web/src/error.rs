//! # HTTP Errors
//!
//! [`ApiError`] is what the auth and user handlers return. Each variant maps
//! to one status and one [`ErrorResponse`] body:
//!
//! | Variant | Status | Body |
//! |---|---|---|
//! | `Code` | 400 | `{"detail": "<CODE>"}` |
//! | `Reason` | 400 | `{"detail": {"code": "<CODE>", "reason": "..."}}` |
//! | `Unauthorized` | 401 | `{"detail": "Unauthorized"}` |
//! | `Forbidden` | 403 | `{"detail": "Forbidden"}` |
//! | `NotFound` | 404 | `{"detail": "Not Found"}` |
//! | `Unprocessable` | 422 | `{"detail": "..."}` |
//! | `Core` | per [`AppError`] | per [`AppError`] |

use std::fmt;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use lib_core::dto::{ErrorDetail, ErrorResponse};
use lib_core::AppError;
use thiserror::Error;

use crate::auth::UserManagerError;

/// Machine-readable failure codes of the auth and user routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    LoginBadCredentials,
    RegisterUserAlreadyExists,
    RegisterInvalidPassword,
    ResetPasswordBadToken,
    ResetPasswordInvalidPassword,
    VerifyUserBadToken,
    VerifyUserAlreadyVerified,
    UpdateUserEmailAlreadyExists,
    UpdateUserInvalidPassword,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::LoginBadCredentials => "LOGIN_BAD_CREDENTIALS",
            ErrorCode::RegisterUserAlreadyExists => "REGISTER_USER_ALREADY_EXISTS",
            ErrorCode::RegisterInvalidPassword => "REGISTER_INVALID_PASSWORD",
            ErrorCode::ResetPasswordBadToken => "RESET_PASSWORD_BAD_TOKEN",
            ErrorCode::ResetPasswordInvalidPassword => "RESET_PASSWORD_INVALID_PASSWORD",
            ErrorCode::VerifyUserBadToken => "VERIFY_USER_BAD_TOKEN",
            ErrorCode::VerifyUserAlreadyVerified => "VERIFY_USER_ALREADY_VERIFIED",
            ErrorCode::UpdateUserEmailAlreadyExists => "UPDATE_USER_EMAIL_ALREADY_EXISTS",
            ErrorCode::UpdateUserInvalidPassword => "UPDATE_USER_INVALID_PASSWORD",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Code(ErrorCode),

    #[error("{code}: {reason}")]
    Reason { code: ErrorCode, reason: String },

    /// No valid credentials were presented.
    #[error("Unauthorized")]
    Unauthorized,

    /// Credentials are valid but lack a required flag.
    #[error("Forbidden")]
    Forbidden,

    #[error("Not Found")]
    NotFound,

    /// The request body is well-formed but semantically invalid.
    #[error("{0}")]
    Unprocessable(String),

    #[error(transparent)]
    Core(#[from] AppError),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Code(_) | ApiError::Reason { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Core(err) => err.status_code(),
        }
    }

    fn detail(&self) -> ErrorDetail {
        match self {
            ApiError::Code(code) => ErrorDetail::Code(code.as_str().to_string()),
            ApiError::Reason { code, reason } => ErrorDetail::Reason {
                code: code.as_str().to_string(),
                reason: reason.clone(),
            },
            ApiError::Unprocessable(msg) => ErrorDetail::Code(msg.clone()),
            other => ErrorDetail::Code(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Core(AppError::from(err))
    }
}

/// Fallback mapping. Routes that give a variant a specific code match it
/// before converting.
impl From<UserManagerError> for ApiError {
    fn from(err: UserManagerError) -> Self {
        match err {
            UserManagerError::Core(err) => ApiError::Core(err),
            UserManagerError::UserNotExists => ApiError::NotFound,
            UserManagerError::UserInactive => ApiError::Unauthorized,
            other => ApiError::Core(AppError::Internal(other.to_string())),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Core(err) = self {
            return err.into_response();
        }

        let status = self.status_code();
        tracing::debug!("[API ERROR] {} -> {}", self, status);

        let mut res = (status, Json(ErrorResponse { detail: self.detail() })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        res
    }
}
