//! # Validation Utilities
//!
//! Input validation helpers.

/// Validate e-mail format (basic structural check).
///
/// Requires exactly one `@`, a non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format".to_string());
    };

    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');

    if local.is_empty() || !domain_ok || email.contains(char::is_whitespace) {
        Err("Invalid email format".to_string())
    } else {
        Ok(())
    }
}

/// Validate minimum length.
pub fn validate_min_length(value: &str, min: usize, field_name: &str) -> Result<(), String> {
    if value.chars().count() < min {
        Err(format!("{} should be at least {} characters", field_name, min))
    } else {
        Ok(())
    }
}
