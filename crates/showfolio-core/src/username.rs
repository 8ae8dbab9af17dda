//! Username validation logic.
//!
//! Usernames are public handles used in profile URLs:
//! - Pattern: ^[a-zA-Z0-9_-]{3,30}$
//! - Stored lowercase and trimmed
//! - Globally unique (enforced by the store's unique index)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 30;

pub const REQUIRED_MESSAGE: &str = "Username is required";
pub const FORMAT_MESSAGE: &str = "Username must be 3-30 characters long and can only contain \
                                  letters, numbers, underscores, and hyphens";
pub const TAKEN_MESSAGE: &str = "Username is already taken";
pub const CHECK_FAILED_MESSAGE: &str = "Error checking username availability";

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_-]{3,30}$").expect("username pattern is valid")
});

/// Validate a username against the handle pattern.
pub fn validate(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(Error::validation("username", REQUIRED_MESSAGE));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(Error::validation("username", FORMAT_MESSAGE));
    }
    Ok(())
}

/// Normalize a username for storage and lookup.
pub fn format(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Validate and normalize in one step.
pub fn validate_and_format(username: &str) -> Result<String> {
    let trimmed = username.trim();
    validate(trimmed)?;
    Ok(format(trimmed))
}

/// Outcome of an availability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub available: bool,
    /// Why the username is unavailable
    pub error: Option<String>,
}

impl Availability {
    pub fn available() -> Self {
        Self {
            available: true,
            error: None,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            error: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        let longest = "x".repeat(30);
        for name in ["abc", "alex", "Ben_Wright", "dev-rel", "a1_", longest.as_str()] {
            assert!(validate(name).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_usernames() {
        let too_long = "x".repeat(31);
        for name in ["ab", "has space", "dots.not.ok", "emoji😀", too_long.as_str()] {
            let err = validate(name).unwrap_err();
            assert_eq!(err.field(), Some("username"));
            assert_eq!(err.to_string(), FORMAT_MESSAGE, "{}", name);
        }
    }

    #[test]
    fn test_empty_username_is_required() {
        let err = validate("").unwrap_err();
        assert_eq!(err.to_string(), REQUIRED_MESSAGE);
    }

    #[test]
    fn test_format() {
        assert_eq!(format("  Alex "), "alex");
        assert_eq!(format("BEN_wright"), "ben_wright");
    }

    #[test]
    fn test_validate_and_format_trims_first() {
        assert_eq!(validate_and_format(" Alex ").unwrap(), "alex");
        assert!(validate_and_format("  ").is_err());
    }
}
