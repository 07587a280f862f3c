//! API error type and the JSON error envelope.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use common::{DomainError, ErrorCode};
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Error returned by a use case.
    Domain(DomainError),
    /// The request itself was malformed or failed validation.
    Validation(String),
}

/// Body of every failed response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub code: ErrorCode,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ApiError {
    fn into_domain(self) -> DomainError {
        match self {
            ApiError::Domain(err) => err,
            ApiError::Validation(message) => DomainError::validation(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.into_domain();
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(code = %err.code(), error = %err.message(), "internal server error");
        } else {
            tracing::debug!(code = %err.code(), error = %err.message(), "request failed");
        }

        let body = ErrorBody {
            status_code: status.as_u16(),
            code: err.code(),
            message: err.message().to_string(),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn envelope(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_domain_error_envelope() {
        let (status, json) = envelope(DomainError::not_found("Product", "p1").into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["statusCode"], 404);
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product with id p1 not found");
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (DomainError::insufficient_stock(0), StatusCode::CONFLICT),
            (DomainError::conflict("dup"), StatusCode::CONFLICT),
            (DomainError::payment_failed("boom"), StatusCode::PAYMENT_REQUIRED),
            (DomainError::unauthorized(None), StatusCode::UNAUTHORIZED),
            (DomainError::mapping("bad"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            let (status, json) = envelope(err.into()).await;
            assert_eq!(status, expected);
            assert_eq!(json["statusCode"], expected.as_u16());
        }
    }

    #[tokio::test]
    async fn test_validation_error_envelope() {
        let (status, json) = envelope(ApiError::Validation("Invalid id".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "Invalid id");
    }
}
