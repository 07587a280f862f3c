//! Field checks shared by the entity factories.

use std::sync::LazyLock;

use common::{DomainError, DomainResult};
use regex::Regex;

pub(crate) static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub(crate) static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-()]{10,}$").expect("valid phone regex"));

/// Fails with `message` unless `value` has at least `min` characters once
/// surrounding whitespace is dropped.
pub(crate) fn min_trimmed_len(value: &str, min: usize, message: &str) -> DomainResult<()> {
    if value.trim().chars().count() < min {
        return Err(DomainError::validation(message));
    }
    Ok(())
}

pub(crate) fn matches(pattern: &Regex, value: &str, message: &str) -> DomainResult<()> {
    if !pattern.is_match(value) {
        return Err(DomainError::validation(message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_trimmed_len_ignores_padding() {
        assert!(min_trimmed_len("  ab  ", 3, "too short").is_err());
        assert!(min_trimmed_len(" abc ", 3, "too short").is_ok());
    }

    #[test]
    fn test_email_pattern() {
        assert!(EMAIL_PATTERN.is_match("jane@example.com"));
        assert!(!EMAIL_PATTERN.is_match("jane@example"));
        assert!(!EMAIL_PATTERN.is_match("jane doe@example.com"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(PHONE_PATTERN.is_match("+57 300 123 4567"));
        assert!(PHONE_PATTERN.is_match("(300) 123-4567"));
        assert!(!PHONE_PATTERN.is_match("12345"));
        assert!(!PHONE_PATTERN.is_match("300-123-abcd"));
    }
}
