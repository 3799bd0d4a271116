//! # Password Reset Handlers
//!
//! `forgot-password` always answers `202` so the endpoint cannot be used to
//! discover which addresses are registered. The reset token reaches the user
//! only through the `on_after_forgot_password` hook.

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use lib_core::dto::{EmailRequest, ResetPasswordRequest};
use tracing::{debug, info, warn};

use crate::auth::{UserManager, UserManagerError};
use crate::error::{ApiError, ApiResult, ErrorCode};

/// `POST /auth/forgot-password` - `202` whatever the outcome.
pub async fn forgot_password(
    State(users): State<UserManager>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<StatusCode> {
    let user = match users.get_by_email(&req.email).await {
        Ok(user) => user,
        Err(UserManagerError::UserNotExists) => {
            debug!("[RESET] Unknown e-mail, nothing to send");
            return Ok(StatusCode::ACCEPTED);
        }
        Err(e) => return Err(e.into()),
    };

    match users.forgot_password(&user).await {
        Ok(()) => info!("[RESET] Reset token issued for user {}", user.id),
        Err(UserManagerError::UserInactive) => debug!("[RESET] Inactive user, nothing to send"),
        Err(e) => return Err(e.into()),
    }

    Ok(StatusCode::ACCEPTED)
}

/// `POST /auth/reset-password`.
///
/// # Returns
///
/// * `200`
/// * `400 RESET_PASSWORD_BAD_TOKEN` - invalid, expired or already used token, or inactive user
/// * `400 {code: RESET_PASSWORD_INVALID_PASSWORD, reason}`
pub async fn reset_password(
    State(users): State<UserManager>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    match users.reset_password(&req.token, &req.password).await {
        Ok(user) => {
            info!("[RESET] Password reset for user {}", user.id);
            Ok(StatusCode::OK)
        }
        Err(
            UserManagerError::InvalidResetPasswordToken
            | UserManagerError::UserNotExists
            | UserManagerError::UserInactive,
        ) => {
            warn!("[RESET] Bad reset token");
            Err(ApiError::Code(ErrorCode::ResetPasswordBadToken))
        }
        Err(UserManagerError::InvalidPassword(reason)) => Err(ApiError::Reason {
            code: ErrorCode::ResetPasswordInvalidPassword,
            reason,
        }),
        Err(e) => Err(e.into()),
    }
}
