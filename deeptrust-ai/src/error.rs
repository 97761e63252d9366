//! Error types for deeptrust-ai
//!
//! `AnalysisError` is the failure taxonomy of the analysis pipeline. `ApiError`
//! maps it (and request-level problems) onto HTTP responses with a flat
//! `{"error": message}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use deeptrust_common::api::ErrorBody;
use thiserror::Error;

/// Upstream bodies are cut to this many characters in error messages
const MAX_UPSTREAM_BODY_CHARS: usize = 512;

/// Analysis pipeline failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// No usable image in the request (user-correctable)
    #[error("{0}")]
    Input(String),

    /// Remote image could not be retrieved (user-correctable)
    #[error("{message}")]
    Fetch { status: Option<u16>, message: String },

    /// Inference service answered with a non-2xx status
    #[error("AI API error [{status}]: {body}")]
    Upstream { status: u16, body: String },

    /// Inference service could not be reached (DNS, reset, timeout)
    #[error("Inference service unreachable: {0}")]
    Transport(String),

    /// Model output is not valid JSON
    #[error("Model response is not valid JSON: {0}")]
    Parse(String),

    /// Model output is JSON but breaks the result contract
    #[error("Model response failed validation at '{field}': {reason}")]
    Schema { field: String, reason: String },

    /// Analysis aborted before completion (service shutdown)
    #[error("Analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    pub fn no_image() -> Self {
        AnalysisError::Input("No image provided".to_string())
    }

    pub fn fetch_status(status: u16) -> Self {
        AnalysisError::Fetch {
            status: Some(status),
            message: format!(
                "Could not fetch image from URL (HTTP {status}). The host may block direct \
                 downloads; try uploading the file directly instead."
            ),
        }
    }

    pub fn fetch_failed(reason: impl std::fmt::Display) -> Self {
        AnalysisError::Fetch {
            status: None,
            message: format!(
                "Could not fetch image from URL: {reason}. Try uploading the file directly instead."
            ),
        }
    }

    pub fn upstream(status: u16, body: &str) -> Self {
        AnalysisError::Upstream {
            status,
            body: truncate_text(body.trim(), MAX_UPSTREAM_BODY_CHARS),
        }
    }

    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::Schema {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Transport failures and 5xx answers are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Transport(_) => true,
            AnalysisError::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short machine-readable category, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Input(_) => "input",
            AnalysisError::Fetch { .. } => "fetch",
            AnalysisError::Upstream { .. } => "upstream",
            AnalysisError::Transport(_) => "transport",
            AnalysisError::Parse(_) => "parse",
            AnalysisError::Schema { .. } => "schema",
            AnalysisError::Cancelled => "cancelled",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalysisError::Input(_) | AnalysisError::Fetch { .. } => StatusCode::BAD_REQUEST,
            AnalysisError::Upstream { .. }
            | AnalysisError::Transport(_)
            | AnalysisError::Parse(_)
            | AnalysisError::Schema { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AnalysisError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body could not be decoded (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Pipeline failure, status chosen by the taxonomy
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Analysis(err) => err.status_code(),
        };

        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_follows_taxonomy() {
        assert_eq!(AnalysisError::no_image().status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AnalysisError::fetch_status(403).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AnalysisError::upstream(429, "slow down").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AnalysisError::Transport("reset".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AnalysisError::Parse("eof".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AnalysisError::schema("verdict", "unknown").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_fetch_message_embeds_status_and_upload_hint() {
        let message = AnalysisError::fetch_status(404).to_string();
        assert!(message.contains("404"));
        assert!(message.contains("uploading the file directly"));
    }

    #[test]
    fn test_retry_policy() {
        assert!(AnalysisError::Transport("timeout".into()).is_retryable());
        assert!(AnalysisError::upstream(502, "bad gateway").is_retryable());
        assert!(!AnalysisError::upstream(400, "bad request").is_retryable());
        assert!(!AnalysisError::upstream(429, "rate limited").is_retryable());
        assert!(!AnalysisError::Parse("x".into()).is_retryable());
    }

    #[test]
    fn test_upstream_body_is_truncated() {
        let long = "x".repeat(2000);
        match AnalysisError::upstream(500, &long) {
            AnalysisError::Upstream { body, .. } => {
                assert_eq!(body.chars().count(), MAX_UPSTREAM_BODY_CHARS + 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
