//! # Authentication Data Transfer Objects
//!
//! Defines request and response structures for the auth and user endpoints.
//!
//! ## Endpoints Using These DTOs
//!
//! ### Session
//! - `POST /auth/jwt/login` - [`LoginForm`] (form-encoded) -> [`BearerResponse`]
//! - `POST /auth/jwt/logout` - bearer token -> `204`
//!
//! ### Account lifecycle
//! - `POST /auth/register` - [`UserCreate`] -> [`UserRead`]
//! - `POST /auth/forgot-password` - [`EmailRequest`] -> `202`
//! - `POST /auth/reset-password` - [`ResetPasswordRequest`] -> `200`
//! - `POST /auth/request-verify-token` - [`EmailRequest`] -> `202`
//! - `POST /auth/verify` - [`VerifyRequest`] -> [`UserRead`]
//!
//! ### Users
//! - `GET|PATCH /users/me` - [`UserUpdate`] -> [`UserRead`]
//! - `GET|PATCH|DELETE /users/{id}` - [`UserUpdate`] -> [`UserRead`]
//!
//! ## Wire Format
//!
//! All DTOs use **snake_case** field names in JSON (default serde behavior).
//! Failures use [`ErrorResponse`]:
//!
//! ```text
//! { "detail": "LOGIN_BAD_CREDENTIALS" }
//! { "detail": { "code": "REGISTER_INVALID_PASSWORD",
//!               "reason": "Password should be at least 8 characters" } }
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::store::models::User;

// region: --- Users

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRead {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            is_verified: user.is_verified,
        }
    }
}

/// Registration request.
///
/// The privilege flags are accepted on the wire but only honoured by
/// privileged callers (the maintenance tool); public registration ignores them.
///
/// # JSON Example
///
/// ```json
/// {
///   "email": "alice@example.com",
///   "password": "correct horse battery staple"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_superuser: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

impl UserCreate {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            is_active: None,
            is_superuser: None,
            is_verified: None,
        }
    }
}

/// Partial user update. Absent fields are left untouched.
///
/// On `/users/me` the privilege flags are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_superuser: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

// endregion: --- Users

// region: --- Session

/// OAuth2 password-grant form. `username` holds the e-mail address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BearerResponse {
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

impl BearerResponse {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

// endregion: --- Session

// region: --- Account lifecycle

/// Body of `forgot-password` and `request-verify-token`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyRequest {
    pub token: String,
}

// endregion: --- Account lifecycle

// region: --- Errors

/// Error body: `{"detail": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub detail: ErrorDetail,
}

/// Either a bare code or a code with a human-readable reason.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ErrorDetail {
    Code(String),
    Reason { code: String, reason: String },
}

impl ErrorDetail {
    /// The machine-readable code in either form.
    pub fn code(&self) -> &str {
        match self {
            ErrorDetail::Code(code) => code,
            ErrorDetail::Reason { code, .. } => code,
        }
    }
}

// endregion: --- Errors
