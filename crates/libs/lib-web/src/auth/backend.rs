//! # Authentication Backend
//!
//! Bearer transport paired with a database token strategy.
//!
//! - **Transport**: the token travels in `Authorization: Bearer <token>`;
//!   login answers with [`BearerResponse`].
//! - **Strategy**: tokens are opaque random strings stored in the
//!   `access_token` table. A token is valid while its row exists and is
//!   younger than the configured lifetime. Logout deletes the row.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::Duration;
use lib_auth::{generate_access_token, ACCESS_TOKEN_LIFETIME_SECS};
use lib_core::dto::BearerResponse;
use lib_core::model::store::models::User;
use lib_core::model::store::{AccessTokenRepository, UserRepository};
use lib_core::{DbSession, ModelManager, Result};
use lib_utils::now_utc;
use tracing::debug;

/// Reads the bearer token from request headers.
#[derive(Debug, Clone)]
pub struct BearerTransport {
    token_url: &'static str,
}

impl BearerTransport {
    pub fn new(token_url: &'static str) -> Self {
        Self { token_url }
    }

    /// Path clients post credentials to.
    pub fn token_url(&self) -> &'static str {
        self.token_url
    }

    /// The token from `Authorization: Bearer <token>`, if present.
    ///
    /// The scheme is matched case-insensitively.
    pub fn token_from_headers<'h>(&self, headers: &'h HeaderMap) -> Option<&'h str> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();

        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
    }

    pub fn login_response(&self, token: String) -> BearerResponse {
        BearerResponse::new(token)
    }
}

/// Database-backed token storage.
#[derive(Debug, Clone, Copy)]
pub struct DatabaseStrategy {
    lifetime_secs: i64,
}

impl DatabaseStrategy {
    pub fn new(lifetime_secs: i64) -> Self {
        Self { lifetime_secs }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// The user owning `token`, if the token exists and has not expired.
    pub async fn read_token(&self, session: &mut DbSession, token: &str) -> Result<Option<User>> {
        let issued_after = now_utc() - Duration::seconds(self.lifetime_secs);
        let Some(access_token) = AccessTokenRepository::get_by_token(session, token, Some(issued_after)).await?
        else {
            return Ok(None);
        };

        Ok(UserRepository::get(session, access_token.user_id).await?)
    }

    /// Issue and store a new token for `user`.
    pub async fn write_token(&self, session: &mut DbSession, user: &User) -> Result<String> {
        let token = generate_access_token();
        AccessTokenRepository::create(session, &token, user.id).await?;
        Ok(token)
    }

    pub async fn destroy_token(&self, session: &mut DbSession, token: &str) -> Result<()> {
        AccessTokenRepository::delete(session, token).await?;
        Ok(())
    }
}

/// The single authentication backend mounted under `/auth/jwt`.
#[derive(Debug, Clone)]
pub struct AuthBackend {
    name: &'static str,
    transport: BearerTransport,
    strategy: DatabaseStrategy,
}

impl Default for AuthBackend {
    fn default() -> Self {
        Self::new(
            "database_strategy",
            BearerTransport::new("auth/jwt/login"),
            DatabaseStrategy::new(ACCESS_TOKEN_LIFETIME_SECS),
        )
    }
}

impl AuthBackend {
    pub fn new(name: &'static str, transport: BearerTransport, strategy: DatabaseStrategy) -> Self {
        Self { name, transport, strategy }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn transport(&self) -> &BearerTransport {
        &self.transport
    }

    pub fn strategy(&self) -> &DatabaseStrategy {
        &self.strategy
    }

    /// Issue a token for `user` and build the login response.
    pub async fn login(&self, mm: &ModelManager, user: &User) -> Result<BearerResponse> {
        let mut session = mm.acquire_session().await?;
        let token = self.strategy.write_token(&mut session, user).await?;
        session.commit().await?;

        debug!("[AUTH] Token issued for user {} via {}", user.id, self.name);
        Ok(self.transport.login_response(token))
    }

    /// Revoke `token`.
    pub async fn logout(&self, mm: &ModelManager, token: &str) -> Result<()> {
        let mut session = mm.acquire_session().await?;
        self.strategy.destroy_token(&mut session, token).await?;
        session.commit().await?;
        Ok(())
    }
}
