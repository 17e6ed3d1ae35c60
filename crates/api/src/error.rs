use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pipeline::PipelineError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Body-limit rejections surface as 413, everything else as a bad request.
    pub fn from_multipart(context: &str, err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(err.body_text())
        } else {
            ApiError::BadRequest(format!("{context}: {}", err.body_text()))
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            ApiError::Pipeline(err) => match err {
                PipelineError::InvalidFilename(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_FILENAME", err.to_string())
                }
                PipelineError::UnsupportedFormat(_) => (
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "UNSUPPORTED_FORMAT",
                    err.to_string(),
                ),
                PipelineError::DocumentUnreadable(_) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "DOCUMENT_UNREADABLE",
                    err.to_string(),
                ),
                PipelineError::ExtractionFailure(_) => {
                    (StatusCode::BAD_GATEWAY, "EXTRACTION_FAILED", err.to_string())
                }
                PipelineError::TaggingFailure(_) => {
                    (StatusCode::BAD_GATEWAY, "TAGGING_FAILED", err.to_string())
                }
                PipelineError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", "File not found".to_string())
                }
                PipelineError::StorageFailure(detail) => {
                    tracing::error!(detail = %detail, "Result storage failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORAGE_FAILURE",
                        "An internal storage error occurred".to_string(),
                    )
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}
