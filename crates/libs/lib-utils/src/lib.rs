//! # Utilities Library
//!
//! Shared helpers for environment parsing, base64url encoding, time and input validation.

pub mod b64;
pub mod envs;
pub mod time;
pub mod validation;

// Re-export commonly used functions
pub use b64::b64u_encode;
pub use envs::{get_env, parse_flag, parse_or};
pub use time::now_utc;
pub use validation::{validate_email, validate_min_length};
