//! # Access Tokens
//!
//! Opaque bearer tokens handed out at login. The token itself carries no
//! claims; validity is decided by the row stored for it in the database.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use lib_utils::b64u_encode;

/// Lifetime of an issued access token, in seconds.
pub const ACCESS_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Generate a new random access token (32 bytes of entropy, 43 base64url chars).
pub fn generate_access_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    b64u_encode(bytes)
}
