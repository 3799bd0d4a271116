//! # Authentication Handlers
//!
//! HTTP request handlers mounted under `/auth`.
//!
//! ## Overview
//!
//! - `POST /auth/jwt/login` - form login, issues a bearer token
//! - `POST /auth/jwt/logout` - revokes the presented token
//! - `POST /auth/register` - creates an account
//! - `POST /auth/forgot-password`, `POST /auth/reset-password` - see [`reset`]
//! - `POST /auth/request-verify-token`, `POST /auth/verify` - see [`verify`]
//!
//! ## Example
//!
//! ```rust,no_run
//! use axum::{Router, routing::post};
//! use lib_web::handlers::auth::{login, logout, register};
//! use lib_web::AppState;
//!
//! let app: Router<AppState> = Router::new()
//!     .route("/auth/jwt/login", post(login))
//!     .route("/auth/jwt/logout", post(logout))
//!     .route("/auth/register", post(register));
//! ```

pub mod reset;
pub mod verify;

pub use reset::{forgot_password, reset_password};
pub use verify::{request_verify_token, verify};

use axum::{
    extract::{Form, Json, State},
    http::StatusCode,
};
use lib_core::dto::{BearerResponse, LoginForm, UserCreate, UserRead};
use lib_utils::validate_email;
use tracing::{debug, info, instrument, warn};

use crate::auth::{AuthBackend, UserManager, UserManagerError};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::middleware::CurrentUser;

/// Login handler - exchanges e-mail and password for a bearer token.
///
/// Expects an `application/x-www-form-urlencoded` body with `username`
/// (the e-mail address) and `password`.
///
/// # Returns
///
/// * `200` - [`BearerResponse`]
/// * `400 LOGIN_BAD_CREDENTIALS` - unknown e-mail, wrong password or inactive account
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(users): State<UserManager>,
    State(backend): State<AuthBackend>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Json<BearerResponse>> {
    info!("[LOGIN] LOGIN ATTEMPT");

    let user = users.authenticate(&form.username, &form.password).await?;
    let Some(user) = user.filter(|u| u.is_active) else {
        warn!("[LOGIN] Bad credentials or inactive account");
        return Err(ApiError::Code(ErrorCode::LoginBadCredentials));
    };

    let response = backend.login(users.model_manager(), &user).await?;
    users.on_after_login(&user).await;

    info!("[LOGIN] User authenticated successfully!");
    debug!("   User ID: {}", user.id);
    Ok(Json(response))
}

/// Logout handler - deletes the presented token.
///
/// Any later request presenting the same token gets `401`.
pub async fn logout(
    State(users): State<UserManager>,
    State(backend): State<AuthBackend>,
    CurrentUser { user, token, .. }: CurrentUser,
) -> ApiResult<StatusCode> {
    backend.logout(users.model_manager(), &token).await?;

    info!("[LOGOUT] Token revoked for user {}", user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// Register handler - creates a new, active, unverified user.
///
/// Privilege flags in the body are ignored.
///
/// # Returns
///
/// * `201` - [`UserRead`]
/// * `400 REGISTER_USER_ALREADY_EXISTS`
/// * `400 {code: REGISTER_INVALID_PASSWORD, reason}`
/// * `422` - malformed e-mail
#[instrument(skip_all, fields(email = %req.email))]
pub async fn register(
    State(users): State<UserManager>,
    Json(req): Json<UserCreate>,
) -> ApiResult<(StatusCode, Json<UserRead>)> {
    info!("[REGISTER] NEW USER REGISTRATION");

    validate_email(&req.email).map_err(ApiError::Unprocessable)?;

    match users.register(req, true).await {
        Ok(user) => {
            info!("[REGISTER] User created: {}", user.id);
            Ok((StatusCode::CREATED, Json(user.into())))
        }
        Err(UserManagerError::UserAlreadyExists) => {
            warn!("[REGISTER] E-mail already registered");
            Err(ApiError::Code(ErrorCode::RegisterUserAlreadyExists))
        }
        Err(UserManagerError::InvalidPassword(reason)) => {
            warn!("[REGISTER] Password rejected: {}", reason);
            Err(ApiError::Reason {
                code: ErrorCode::RegisterInvalidPassword,
                reason,
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests;
