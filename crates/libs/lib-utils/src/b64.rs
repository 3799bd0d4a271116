//! # Base64 Encoding
//!
//! URL-safe base64 without padding, the alphabet used for opaque tokens.

use base64::{Engine as _, engine::general_purpose};

/// Encode bytes to base64 URL-safe string (no padding).
///
/// 32 input bytes always produce 43 output characters.
pub fn b64u_encode(content: impl AsRef<[u8]>) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(content)
}
