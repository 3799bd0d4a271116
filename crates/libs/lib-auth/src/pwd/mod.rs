//! # Password Hashing
//!
//! Password policy, hashing and verification using Argon2.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lib_utils::validate_min_length;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Check a candidate password against the account policy.
///
/// Returns the human readable reason on rejection.
pub fn validate_password(password: &str, email: &str) -> Result<(), String> {
    validate_min_length(password, MIN_PASSWORD_LENGTH, "Password")?;

    let email = email.trim();
    if !email.is_empty() && password.to_lowercase().contains(&email.to_lowercase()) {
        return Err("Password should not contain e-mail".to_string());
    }

    Ok(())
}

/// Hash a secret using the Argon2 algorithm.
pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| format!("Failed to hash password: {}", e))?
        .to_string();

    Ok(password_hash)
}

/// Verify a plaintext secret against an Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| format!("Failed to parse hash: {}", e))?;

    let argon2 = Argon2::default();

    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
