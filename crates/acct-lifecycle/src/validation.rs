//! Input validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

/// Maximum email length (RFC 5321).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Address shape: non-empty local part, non-empty domain containing a dot,
/// no whitespace and a single `@`.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("EMAIL_RE is a valid regex pattern")
});

/// Validates the shape of an email address. Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns `ValidationError::InvalidEmail` if the address is malformed.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.len() > MAX_EMAIL_LENGTH || !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}
