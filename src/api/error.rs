//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::pipeline::inference::InferenceError;
use crate::pipeline::orchestrator::DecisionError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping. 4xx-equivalents cover
/// malformed input; 5xx-equivalents cover internal failure, per the
/// alert-trigger collaborator contract.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("Model unavailable")]
    ModelUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DecisionError> for ApiError {
    fn from(err: DecisionError) -> Self {
        match err {
            DecisionError::InvalidRecord(e) => ApiError::InvalidRecord(e.to_string()),
            DecisionError::Encoding(e) => ApiError::EncodingFailed(e.to_string()),
            DecisionError::Classification(e) => match e {
                InferenceError::SchemaMismatch { .. } => ApiError::SchemaMismatch(e.to_string()),
                InferenceError::ModelUnavailable(detail) => ApiError::ModelUnavailable(detail),
                InferenceError::InvalidArtifact(detail) => ApiError::Internal(detail),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::InvalidRecord(detail) => (
                StatusCode::BAD_REQUEST,
                "INVALID_RECORD",
                detail.clone(),
            ),
            ApiError::EncodingFailed(detail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "ENCODING_FAILED",
                detail.clone(),
            ),
            ApiError::SchemaMismatch(detail) => {
                // Deployment bug — operators must see it.
                tracing::error!(%detail, "schema mismatch surfaced to API");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SCHEMA_MISMATCH",
                    "Decision could not be produced".to_string(),
                )
            }
            ApiError::ModelUnavailable(detail) => {
                tracing::error!(%detail, "model unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "MODEL_UNAVAILABLE",
                    "Model is not loaded".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordError;
    use crate::pipeline::encoding::EncodingError;

    #[test]
    fn invalid_record_maps_to_bad_request() {
        let api: ApiError = DecisionError::InvalidRecord(RecordError::NoVitals).into();
        let response = api.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn encoding_failure_maps_to_unprocessable() {
        let api: ApiError = DecisionError::Encoding(EncodingError::InvalidBinary {
            field: "diabetes".into(),
            value: "maybe".into(),
        })
        .into();
        assert_eq!(
            api.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn schema_mismatch_maps_to_internal_error() {
        let api: ApiError =
            DecisionError::Classification(InferenceError::SchemaMismatch {
                expected: "24 features".into(),
                got: "23 features".into(),
            })
            .into();
        assert_eq!(
            api.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn model_unavailable_maps_to_service_unavailable() {
        let api: ApiError = DecisionError::Classification(
            InferenceError::ModelUnavailable("gone".into()),
        )
        .into();
        assert_eq!(
            api.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
