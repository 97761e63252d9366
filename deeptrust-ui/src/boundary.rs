//! Service boundary
//!
//! The one network call the client makes: POST the submission to
//! `/analyze-image` and read back either a result or an `{error}` body.

use async_trait::async_trait;
use deeptrust_common::api::{AnalyzeImageRequest, ErrorBody, ANALYZE_IMAGE_PATH};
use deeptrust_common::AnalysisResult;

use crate::config::ClientConfig;
use crate::error::BoundaryError;

/// Anything that can analyze a submission
#[async_trait]
pub trait AnalysisBoundary: Send + Sync {
    async fn analyze(&self, request: AnalyzeImageRequest) -> Result<AnalysisResult, BoundaryError>;
}

/// HTTP client for a deeptrust-ai service
pub struct HttpBoundary {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpBoundary {
    pub fn new(config: &ClientConfig) -> deeptrust_common::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| deeptrust_common::Error::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}{}", config.server_url.trim_end_matches('/'), ANALYZE_IMAGE_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisBoundary for HttpBoundary {
    async fn analyze(&self, request: AnalyzeImageRequest) -> Result<AnalysisResult, BoundaryError> {
        tracing::debug!(endpoint = %self.endpoint, "Submitting image for analysis");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| BoundaryError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BoundaryError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or_default();
            tracing::warn!(status = status.as_u16(), error = %message, "Analysis service refused");
            return Err(BoundaryError::Service {
                status: status.as_u16(),
                message,
            });
        }

        // `{error}` on a 200 is still a failure
        if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
            return Err(BoundaryError::Service {
                status: status.as_u16(),
                message: body.error,
            });
        }

        serde_json::from_str::<AnalysisResult>(&text).map_err(|e| BoundaryError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = ClientConfig {
            server_url: "http://localhost:5730/".to_string(),
            ..Default::default()
        };
        let boundary = HttpBoundary::new(&config).unwrap();
        assert_eq!(boundary.endpoint(), "http://localhost:5730/analyze-image");
    }
}
