//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement, so limits are
//! applied here before anything reaches a repository.

use shared::ApiError;

// ── Text length limits ──────────────────────────────────────────────

/// Usernames and names
pub const MAX_NAME_LEN: usize = 50;

/// Movie titles
pub const MAX_TITLE_LEN: usize = 200;

/// Descriptions, review bodies, report details
pub const MAX_TEXT_LEN: usize = 2000;

/// Reasons and notes (cancellation reason, moderator notes)
pub const MAX_NOTE_LEN: usize = 500;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 128;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(ApiError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), ApiError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(ApiError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_required_text_is_rejected() {
        assert!(validate_required_text("  ", "title", MAX_TITLE_LEN).is_err());
        assert!(validate_required_text("Heat", "title", MAX_TITLE_LEN).is_ok());
    }

    #[test]
    fn overlong_text_is_rejected() {
        let long = "x".repeat(MAX_NOTE_LEN + 1);
        assert!(validate_required_text(&long, "reason", MAX_NOTE_LEN).is_err());
        assert!(validate_optional_text(&Some(long), "reason", MAX_NOTE_LEN).is_err());
        assert!(validate_optional_text(&None, "reason", MAX_NOTE_LEN).is_ok());
    }
}
