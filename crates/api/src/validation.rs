//! Request body checks run before a use case sees the input.

use std::sync::LazyLock;

use common::{DomainError, DomainResult};
use regex::Regex;

pub static CARD_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{13,19}$").expect("valid card number regex"));

pub static EXPIRATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/\d{2}$").expect("valid expiration regex"));

pub static CVV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3,4}$").expect("valid cvv regex"));

pub static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// `value` must hold between `min` and `max` characters.
pub fn length(field: &str, value: &str, min: usize, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(DomainError::validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

pub fn not_blank(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn pattern(pattern: &Regex, value: &str, message: &str) -> DomainResult<()> {
    if !pattern.is_match(value) {
        return Err(DomainError::validation(message));
    }
    Ok(())
}

pub fn non_negative(field: &str, value: f64) -> DomainResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::validation(format!(
            "{field} must not be less than 0"
        )));
    }
    Ok(())
}

/// Largest fee a request may carry, in major units.
pub const MAX_FEE: f64 = 1_000_000_000.0;

/// A fee must be non-negative and at most [`MAX_FEE`].
pub fn fee(field: &str, value: f64) -> DomainResult<()> {
    non_negative(field, value)?;
    if value > MAX_FEE {
        return Err(DomainError::validation(format!(
            "{field} must not be greater than {MAX_FEE}"
        )));
    }
    Ok(())
}
