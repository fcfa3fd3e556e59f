//! Common error type and alias.
//!
//! Transport failures, backend rejections, malformed responses and job
//! failures are kept apart so callers (and logs) can tell a request that
//! never reached ComfyUI from one that ComfyUI answered with nonsense.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("ComfyUI rejected {endpoint} (status {status}): {body}")]
    Rejected {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {context}: {source}")]
    MalformedResponse {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("ComfyUI job {prompt_id} failed with status '{status}'")]
    JobFailed { prompt_id: String, status: String },

    #[error("ComfyUI job {0} finished without an output node carrying images")]
    NoOutput(String),

    #[error("Gave up waiting for job {prompt_id} after {attempts} polls")]
    PollExhausted { prompt_id: String, attempts: u32 },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to upload '{image}': {reason}")]
    Upload { image: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, "BACKEND_UNREACHABLE"),
            AppError::Rejected { .. } => (StatusCode::BAD_GATEWAY, "BACKEND_REJECTED"),
            AppError::MalformedResponse { .. } => (StatusCode::BAD_GATEWAY, "BACKEND_MALFORMED"),
            AppError::JobFailed { .. } | AppError::NoOutput(_) => {
                (StatusCode::BAD_GATEWAY, "JOB_FAILED")
            }
            AppError::PollExhausted { .. } => (StatusCode::GATEWAY_TIMEOUT, "JOB_TIMEOUT"),
            AppError::Upload { .. } => (StatusCode::BAD_GATEWAY, "UPLOAD_FAILED"),
            AppError::Template(_) | AppError::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "Tool request failed");
        }
        let body = json!({
            "error": self.to_string(),
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_maps_to_bad_request() {
        let resp = AppError::InvalidInput("image1 is required".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn job_failures_map_to_bad_gateway() {
        let err = AppError::JobFailed {
            prompt_id: "abc".into(),
            status: "error".into(),
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::NoOutput("abc".into()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
