//! # E-mail Verification Handlers

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use lib_core::dto::{EmailRequest, UserRead, VerifyRequest};
use tracing::{debug, info, warn};

use crate::auth::{UserManager, UserManagerError};
use crate::error::{ApiError, ApiResult, ErrorCode};

/// `POST /auth/request-verify-token` - `202` whatever the outcome.
///
/// The token is only issued for active, unverified users and reaches them
/// through the `on_after_request_verify` hook.
pub async fn request_verify_token(
    State(users): State<UserManager>,
    Json(req): Json<EmailRequest>,
) -> ApiResult<StatusCode> {
    let user = match users.get_by_email(&req.email).await {
        Ok(user) => user,
        Err(UserManagerError::UserNotExists) => return Ok(StatusCode::ACCEPTED),
        Err(e) => return Err(e.into()),
    };

    match users.request_verify(&user).await {
        Ok(()) => info!("[VERIFY] Verification token issued for user {}", user.id),
        Err(UserManagerError::UserInactive | UserManagerError::UserAlreadyVerified) => {
            debug!("[VERIFY] Nothing to send for user {}", user.id);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(StatusCode::ACCEPTED)
}

/// `POST /auth/verify`.
///
/// # Returns
///
/// * `200` - [`UserRead`] with `is_verified = true`
/// * `400 VERIFY_USER_BAD_TOKEN`
/// * `400 VERIFY_USER_ALREADY_VERIFIED`
pub async fn verify(
    State(users): State<UserManager>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<UserRead>> {
    match users.verify(&req.token).await {
        Ok(user) => {
            info!("[VERIFY] User {} verified", user.id);
            Ok(Json(user.into()))
        }
        Err(UserManagerError::InvalidVerifyToken | UserManagerError::UserNotExists) => {
            warn!("[VERIFY] Bad verification token");
            Err(ApiError::Code(ErrorCode::VerifyUserBadToken))
        }
        Err(UserManagerError::UserAlreadyVerified) => {
            Err(ApiError::Code(ErrorCode::VerifyUserAlreadyVerified))
        }
        Err(e) => Err(e.into()),
    }
}
