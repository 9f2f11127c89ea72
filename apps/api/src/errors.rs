use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::documents::extract::DocumentError;
use crate::roast::pipeline::PipelineError;
use crate::roast::sanitizer::ValidationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited { retry_after: Duration },

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Model reply unusable: {detail}")]
    ModelReplyUnusable {
        field: Option<String>,
        detail: String,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<DocumentError> for AppError {
    fn from(e: DocumentError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        tracing::debug!("Pipeline stopped at {} stage", e.stage());
        match e {
            PipelineError::RateLimited { retry_after } => AppError::RateLimited { retry_after },
            PipelineError::AdmissionUnavailable(e) => {
                AppError::Internal(anyhow::anyhow!("admission store unavailable: {e}"))
            }
            PipelineError::ValidationFailed(e) => e.into(),
            PipelineError::InvocationFailed(e) => AppError::ModelUnavailable(e.to_string()),
            PipelineError::ExtractionFailed(e) => AppError::ModelReplyUnusable {
                field: e.field().map(str::to_string),
                detail: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Too many requests. Please wait a minute and try again.".to_string(),
            ),
            AppError::ModelUnavailable(msg) => {
                tracing::error!("Model unavailable: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MODEL_UNAVAILABLE",
                    "The AI reviewer could not be reached. Please try again.".to_string(),
                )
            }
            AppError::ModelReplyUnusable { field, detail } => {
                tracing::error!("Model reply unusable: {detail}");
                let message = match field {
                    Some(field) => format!(
                        "The AI reviewer returned an incomplete result (field '{field}'). Please try again."
                    ),
                    None => "The AI reviewer returned an unreadable result. Please try again."
                        .to_string(),
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "MODEL_REPLY_UNUSABLE",
                    message,
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

        let mut response = (status, body).into_response();
        if let AppError::RateLimited { retry_after } = &self {
            // Round up so clients never retry before the window resets.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roast::extractor::ExtractionError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_rate_limited_maps_to_429_with_retry_after() {
        let response = AppError::RateLimited {
            retry_after: Duration::from_millis(12_300),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "13");
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "RATE_LIMITED");
    }

    #[tokio::test]
    async fn test_validation_maps_to_400_with_reason() {
        let err: AppError = ValidationError::TooShort { min: 100, actual: 50 }.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]["message"].as_str().unwrap().contains("too short"));
    }

    #[tokio::test]
    async fn test_schema_violation_names_field_but_not_raw_reply() {
        let err: AppError = PipelineError::ExtractionFailed(ExtractionError::SchemaViolation {
            schema: "AnalysisResult",
            field: "roasts".to_string(),
            reason: "required field is missing".to_string(),
        })
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "MODEL_REPLY_UNUSABLE");
        assert!(body["error"]["message"].as_str().unwrap().contains("roasts"));
    }

    #[tokio::test]
    async fn test_document_errors_are_validation_failures() {
        let err: AppError = DocumentError::NoExtractableText.into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invocation_failure_hides_backend_detail() {
        let err: AppError = PipelineError::InvocationFailed(
            crate::llm_client::InvocationError::Api {
                status: 401,
                message: "invalid x-api-key".to_string(),
            },
        )
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "MODEL_UNAVAILABLE");
        assert!(!body.to_string().contains("x-api-key"));
    }
}
