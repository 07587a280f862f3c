//! Cross-layer domain error value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error code carried by every [`DomainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    Conflict,
    InternalError,
    Unauthorized,
    InsufficientStock,
    PaymentFailed,
    /// A mapping function panicked while transforming a successful value.
    MappingError,
}

impl ErrorCode {
    /// Returns the wire name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::PaymentFailed => "PAYMENT_FAILED",
            ErrorCode::MappingError => "MAPPING_ERROR",
        }
    }

    /// Returns the HTTP status associated with the code.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::PaymentFailed => 402,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict | ErrorCode::InsufficientStock => 409,
            ErrorCode::InternalError | ErrorCode::MappingError => 500,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An expected business failure: a code plus a human-readable message.
///
/// Use cases return these as values; the HTTP layer is the only place
/// they become responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct DomainError {
    code: ErrorCode,
    message: String,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// `"<Entity> with id <id> not found"`.
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("{entity} with id {id} not found"),
        )
    }

    /// `"<Entity> not found"`, for lookups that are not keyed by id.
    pub fn missing(entity: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("{entity} not found"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn unauthorized(message: Option<&str>) -> Self {
        Self::new(ErrorCode::Unauthorized, message.unwrap_or("Unauthorized"))
    }

    pub fn insufficient_stock(available: u32) -> Self {
        Self::new(
            ErrorCode::InsufficientStock,
            format!("Insufficient stock. Available: {available}"),
        )
    }

    pub fn payment_failed(reason: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::PaymentFailed, format!("Payment failed: {reason}"))
    }

    pub fn mapping(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MappingError, message)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> u16 {
        self.code.status_code()
    }
}
