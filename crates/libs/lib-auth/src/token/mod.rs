//! # Purpose Tokens
//!
//! Short-lived JWTs for the password-reset and e-mail verification flows.
//!
//! Each purpose has its own audience, so a token minted for one flow is
//! rejected by the other even when both are signed with the same secret.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    ResetPassword,
    Verify,
}

impl TokenPurpose {
    /// JWT `aud` claim for this purpose.
    pub fn audience(self) -> &'static str {
        match self {
            TokenPurpose::ResetPassword => "users:reset",
            TokenPurpose::Verify => "users:verify",
        }
    }

    /// Token lifetime in seconds.
    pub fn lifetime_secs(self) -> i64 {
        3600
    }
}

/// JWT claims for purpose tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Audience, one of the [`TokenPurpose`] audiences
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// E-mail the verification was requested for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Fingerprint of the password hash at issue time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_fgpt: Option<String>,
}

impl Claims {
    /// Build claims for `purpose`, issued now.
    pub fn new(purpose: TokenPurpose, sub: impl Into<String>) -> Self {
        let now = Utc::now();
        let exp = now + Duration::seconds(purpose.lifetime_secs());

        Self {
            sub: sub.into(),
            aud: purpose.audience().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            email: None,
            password_fgpt: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_password_fgpt(mut self, fgpt: impl Into<String>) -> Self {
        self.password_fgpt = Some(fgpt.into());
        self
    }
}

/// Sign claims into a compact JWT.
pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("Failed to encode JWT: {}", e))
}

/// Decode and validate a JWT for the given purpose (signature, expiry, audience).
pub fn decode_token(token: &str, secret: &str, purpose: TokenPurpose) -> Result<Claims, String> {
    let mut validation = Validation::default();
    validation.set_audience(&[purpose.audience()]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| format!("Failed to decode JWT: {}", e))?;

    Ok(token_data.claims)
}
