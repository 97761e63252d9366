//! Wire types for the `/analyze-image` endpoint
//!
//! Shared by the service handler and the HTTP client so both sides agree on the
//! camelCase request fields and the flat `{error}` body.

use serde::{Deserialize, Serialize};

/// Route of the analysis endpoint
pub const ANALYZE_IMAGE_PATH: &str = "/analyze-image";

/// POST /analyze-image request body
///
/// `image_base64` is raw base64 without a `data:` prefix. Empty strings count as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// MIME type of the uploaded file, used for inline payloads only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_mime_type: Option<String>,
}

impl AnalyzeImageRequest {
    pub fn inline(base64_payload: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            image_base64: Some(base64_payload.into()),
            image_url: None,
            image_mime_type: mime_type,
        }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self {
            image_base64: None,
            image_url: Some(url.into()),
            image_mime_type: None,
        }
    }
}

/// Error body returned with every 4xx/5xx response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
