use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extract::ExtractionError;
use crate::llm_client::LlmError;
use crate::report::ReportError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Incorrect access code")]
    InvalidCredential,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Usage limit of {max} analyses reached for this session")]
    QuotaExceeded { max: u32 },

    #[error("PDF read error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Extracted text too short ({chars} characters, need more than {min})")]
    EmptyContent { chars: usize, min: usize },

    #[error("AI error: {0}")]
    Ai(String),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::MissingApiKey => {
                AppError::Configuration("AI API key is missing from the secrets".to_string())
            }
            other => AppError::Ai(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    self.to_string(),
                )
            }
            AppError::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIAL",
                self.to_string(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "An access code is required".to_string(),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge(_) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                self.to_string(),
            ),
            AppError::QuotaExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "QUOTA_EXCEEDED",
                self.to_string(),
            ),
            AppError::Extraction(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_ERROR",
                self.to_string(),
            ),
            AppError::EmptyContent { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EMPTY_CONTENT",
                "The PDF looks empty or unreadable (is it a scanned image?)".to_string(),
            ),
            AppError::Ai(msg) => {
                tracing::error!("AI error: {msg}");
                (StatusCode::BAD_GATEWAY, "AI_SERVICE_ERROR", self.to_string())
            }
            AppError::Report(e) => {
                tracing::error!("Report error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPORT_ERROR",
                    "The document could not be generated".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_maps_to_configuration_error() {
        let err: AppError = LlmError::MissingApiKey.into();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_upstream_failure_maps_to_ai_error() {
        let err: AppError = LlmError::Api {
            status: 403,
            message: "API key not valid".to_string(),
        }
        .into();
        match err {
            AppError::Ai(msg) => assert!(msg.contains("API key not valid")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::QuotaExceeded { max: 5 }.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::EmptyContent { chars: 12, min: 100 }
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::InvalidCredential.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::PayloadTooLarge("limit".to_string())
                .into_response()
                .status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::Ai("boom".to_string()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
