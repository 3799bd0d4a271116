//! # User Handlers
//!
//! Self-service (`/users/me`, any active user) and administration
//! (`/users/{id}`, superusers only).
//!
//! A malformed id and an unknown id both answer `404`.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use lib_core::dto::{UserRead, UserUpdate};
use lib_core::model::store::models::User;
use lib_utils::validate_email;
use tracing::info;
use uuid::Uuid;

use crate::auth::{UserManager, UserManagerError};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::middleware::{CurrentSuperuser, CurrentUser};

// region: --- Helpers

async fn user_by_path_id(users: &UserManager, id: &str) -> ApiResult<User> {
    let id = Uuid::parse_str(id).map_err(|_| ApiError::NotFound)?;
    users.get(id).await.map_err(ApiError::from)
}

async fn apply_update(users: &UserManager, user: &User, update: UserUpdate, safe: bool) -> ApiResult<User> {
    if let Some(email) = &update.email {
        validate_email(email).map_err(ApiError::Unprocessable)?;
    }

    match users.update(user, update, safe).await {
        Ok(user) => Ok(user),
        Err(UserManagerError::UserAlreadyExists) => {
            Err(ApiError::Code(ErrorCode::UpdateUserEmailAlreadyExists))
        }
        Err(UserManagerError::InvalidPassword(reason)) => Err(ApiError::Reason {
            code: ErrorCode::UpdateUserInvalidPassword,
            reason,
        }),
        Err(e) => Err(e.into()),
    }
}

// endregion: --- Helpers

// region: --- Self-service

/// `GET /users/me`
pub async fn get_me(CurrentUser { user, .. }: CurrentUser) -> Json<UserRead> {
    Json(user.into())
}

/// `PATCH /users/me` - privilege flags in the body are ignored.
pub async fn patch_me(
    State(users): State<UserManager>,
    CurrentUser { user, .. }: CurrentUser,
    Json(update): Json<UserUpdate>,
) -> ApiResult<Json<UserRead>> {
    let user = apply_update(&users, &user, update, true).await?;
    Ok(Json(user.into()))
}

// endregion: --- Self-service

// region: --- Administration

/// `GET /users/{id}`
pub async fn get_user(
    State(users): State<UserManager>,
    _admin: CurrentSuperuser,
    Path(id): Path<String>,
) -> ApiResult<Json<UserRead>> {
    let user = user_by_path_id(&users, &id).await?;
    Ok(Json(user.into()))
}

/// `PATCH /users/{id}` - may change any field, including privilege flags.
pub async fn patch_user(
    State(users): State<UserManager>,
    CurrentSuperuser { user: admin, .. }: CurrentSuperuser,
    Path(id): Path<String>,
    Json(update): Json<UserUpdate>,
) -> ApiResult<Json<UserRead>> {
    let user = user_by_path_id(&users, &id).await?;
    let user = apply_update(&users, &user, update, false).await?;

    info!("[USERS] User {} updated by {}", user.id, admin.id);
    Ok(Json(user.into()))
}

/// `DELETE /users/{id}` - `204`; the user's tokens are deleted with it.
pub async fn delete_user(
    State(users): State<UserManager>,
    CurrentSuperuser { user: admin, .. }: CurrentSuperuser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let user = user_by_path_id(&users, &id).await?;
    users.delete(&user).await?;

    info!("[USERS] User {} deleted by {}", user.id, admin.id);
    Ok(StatusCode::NO_CONTENT)
}

// endregion: --- Administration
