//! # Authentication Library
//!
//! Password hashing, purpose-scoped JWTs (password reset, e-mail verification)
//! and opaque access-token generation.

pub mod access;
pub mod pwd;
pub mod token;

// Re-export commonly used types
pub use access::{generate_access_token, ACCESS_TOKEN_LIFETIME_SECS};
pub use pwd::{hash_password, validate_password, verify_password};
pub use token::{decode_token, encode_token, Claims, TokenPurpose};
