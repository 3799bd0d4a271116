//! # Current-User Extraction
//!
//! [`CurrentUser`] resolves the bearer token to a user and checks it against
//! a [`TrustLevel`] before the handler runs.
//!
//! | Extractor | Requires | Missing token / inactive | Flag missing |
//! |---|---|---|---|
//! | [`CurrentUser`] / [`CurrentActiveUser`] | active | 401 | - |
//! | [`CurrentVerifiedUser`] | active + verified | 401 | 403 |
//! | [`CurrentSuperuser`] | active + superuser | 401 | 403 |
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lib_web::middleware::{CurrentUser, CurrentSuperuser};
//!
//! async fn me(CurrentUser { user, .. }: CurrentUser) -> String {
//!     format!("Hello {}!", user.email)
//! }
//!
//! async fn admin_only(_admin: CurrentSuperuser) {}
//! ```
//!
//! The lookup uses its own session, which is released before the handler
//! body runs.

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use lib_core::model::store::models::User;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::server::AppState;

/// Flags a user must carry. `active` is always part of the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrustLevel {
    pub active: bool,
    pub verified: bool,
    pub superuser: bool,
}

impl TrustLevel {
    pub const ACTIVE: Self = Self { active: true, verified: false, superuser: false };
    pub const VERIFIED: Self = Self { active: true, verified: true, superuser: false };
    pub const SUPERUSER: Self = Self { active: true, verified: false, superuser: true };

    /// `Unauthorized` for an inactive user, `Forbidden` for a missing flag.
    pub fn check(&self, user: &User) -> Result<(), ApiError> {
        if self.active && !user.is_active {
            return Err(ApiError::Unauthorized);
        }
        if (self.verified && !user.is_verified) || (self.superuser && !user.is_superuser) {
            return Err(ApiError::Forbidden);
        }
        Ok(())
    }
}

/// Type-level [`TrustLevel`] selector for [`CurrentUser`].
pub trait RequiredTrust: Send + Sync + 'static {
    const LEVEL: TrustLevel;
}

#[derive(Debug)]
pub struct Active;
#[derive(Debug)]
pub struct Verified;
#[derive(Debug)]
pub struct Superuser;

impl RequiredTrust for Active {
    const LEVEL: TrustLevel = TrustLevel::ACTIVE;
}
impl RequiredTrust for Verified {
    const LEVEL: TrustLevel = TrustLevel::VERIFIED;
}
impl RequiredTrust for Superuser {
    const LEVEL: TrustLevel = TrustLevel::SUPERUSER;
}

/// The authenticated user and the token that authenticated them.
#[derive(Debug)]
pub struct CurrentUser<L: RequiredTrust = Active> {
    pub user: User,
    pub token: String,
    _level: PhantomData<L>,
}

pub type CurrentActiveUser = CurrentUser<Active>;
pub type CurrentVerifiedUser = CurrentUser<Verified>;
pub type CurrentSuperuser = CurrentUser<Superuser>;

impl<S, L> FromRequestParts<S> for CurrentUser<L>
where
    AppState: FromRef<S>,
    S: Send + Sync,
    L: RequiredTrust,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = state
            .backend
            .transport()
            .token_from_headers(&parts.headers)
            .ok_or_else(|| {
                debug!("[AUTH] Missing or malformed Authorization header");
                ApiError::Unauthorized
            })?
            .to_string();

        let user = {
            let mut session = state.mm.acquire_session().await?;
            state.backend.strategy().read_token(&mut session, &token).await?
        };
        let user = user.ok_or_else(|| {
            warn!("[AUTH] Unknown or expired access token");
            ApiError::Unauthorized
        })?;

        L::LEVEL.check(&user).inspect_err(|e| {
            debug!("[AUTH] User {} rejected: {}", user.id, e);
        })?;

        Ok(Self {
            user,
            token,
            _level: PhantomData,
        })
    }
}
