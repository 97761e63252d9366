//! Input normalization
//!
//! Resolves an inline upload or a remote image URL into one canonical data URI.
//!
//! Precedence: when a request carries both an inline payload and a URL, the inline
//! payload is used and the URL is ignored.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use deeptrust_common::api::AnalyzeImageRequest;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER};
use reqwest::Url;

use crate::config::FetchConfig;
use crate::error::AnalysisError;

/// Content type assumed when none is known
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

const BROWSER_IMAGE_ACCEPT: &str =
    "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";

/// Image as supplied by the caller, exactly one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageInput {
    InlineBytes {
        mime_hint: Option<String>,
        base64_payload: String,
    },
    RemoteReference {
        url: String,
    },
}

impl ImageInput {
    /// Pick the image source from a request body
    ///
    /// Blank strings count as absent. Inline wins over a URL.
    pub fn from_request(request: AnalyzeImageRequest) -> Result<Self, AnalysisError> {
        let AnalyzeImageRequest {
            image_base64,
            image_url,
            image_mime_type,
        } = request;

        if let Some(payload) = image_base64.filter(|p| !p.trim().is_empty()) {
            return Ok(ImageInput::InlineBytes {
                mime_hint: image_mime_type.filter(|m| !m.trim().is_empty()),
                base64_payload: payload,
            });
        }

        match image_url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) {
            Some(url) => Ok(ImageInput::RemoteReference { url }),
            None => Err(AnalysisError::no_image()),
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            ImageInput::InlineBytes { .. } => "inline",
            ImageInput::RemoteReference { .. } => "remote",
        }
    }
}

/// Normalized image: content type plus a self-contained data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalImage {
    content_type: String,
    data_uri: String,
}

impl CanonicalImage {
    fn from_base64(content_type: &str, payload: &str) -> Self {
        Self {
            content_type: content_type.to_string(),
            data_uri: format!("data:{content_type};base64,{payload}"),
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }
}

/// Turns [`ImageInput`] into [`CanonicalImage`], fetching remote images over HTTP
pub struct InputNormalizer {
    http_client: reqwest::Client,
    max_image_bytes: usize,
}

impl InputNormalizer {
    pub fn new(config: &FetchConfig) -> deeptrust_common::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| deeptrust_common::Error::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            max_image_bytes: config.max_image_bytes,
        })
    }

    pub async fn normalize(&self, input: ImageInput) -> Result<CanonicalImage, AnalysisError> {
        match input {
            ImageInput::InlineBytes {
                mime_hint,
                base64_payload,
            } => Ok(normalize_inline(mime_hint.as_deref(), &base64_payload)),
            ImageInput::RemoteReference { url } => self.fetch_remote(&url).await,
        }
    }

    /// GET the image the way a browser would, so naive hot-link checks pass
    async fn fetch_remote(&self, url: &str) -> Result<CanonicalImage, AnalysisError> {
        let parsed = Url::parse(url)
            .map_err(|e| AnalysisError::Input(format!("Invalid image URL '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AnalysisError::Input(format!(
                "Unsupported image URL scheme '{}': only http and https are fetched",
                parsed.scheme()
            )));
        }

        tracing::debug!(url = %parsed, "Fetching remote image");

        let response = self
            .http_client
            .get(parsed.clone())
            .header(ACCEPT, BROWSER_IMAGE_ACCEPT)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(REFERER, parsed.as_str())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %parsed, error = %e, "Remote image request failed");
                AnalysisError::fetch_failed(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %parsed, status = status.as_u16(), "Remote image host refused");
            return Err(AnalysisError::fetch_status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let bytes = self.read_capped(response, &parsed).await?;

        tracing::info!(
            url = %parsed,
            content_type = %content_type,
            bytes = bytes.len(),
            "Remote image fetched"
        );

        Ok(CanonicalImage::from_base64(&content_type, &BASE64.encode(&bytes)))
    }
}

impl InputNormalizer {
    /// Read the body, refusing it once it passes `max_image_bytes`
    async fn read_capped(
        &self,
        mut response: reqwest::Response,
        url: &Url,
    ) -> Result<Vec<u8>, AnalysisError> {
        let too_large = || {
            tracing::warn!(url = %url, limit = self.max_image_bytes, "Remote image too large");
            AnalysisError::fetch_failed(format!(
                "image is larger than {} bytes",
                self.max_image_bytes
            ))
        };

        if let Some(declared) = response.content_length() {
            if declared > self.max_image_bytes as u64 {
                return Err(too_large());
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AnalysisError::fetch_failed(format!("reading body failed ({e})")))?
        {
            if bytes.len() + chunk.len() > self.max_image_bytes {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

/// Wrap an inline payload verbatim; no decoding and no size checks
pub fn normalize_inline(mime_hint: Option<&str>, base64_payload: &str) -> CanonicalImage {
    CanonicalImage::from_base64(mime_hint.unwrap_or(DEFAULT_CONTENT_TYPE), base64_payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_defaults_to_jpeg() {
        let image = normalize_inline(None, "AAAA");
        assert_eq!(image.content_type(), "image/jpeg");
        assert_eq!(image.data_uri(), "data:image/jpeg;base64,AAAA");
    }

    #[test]
    fn test_inline_uses_hint_and_payload_verbatim() {
        let image = normalize_inline(Some("image/webp"), "not-even-base64");
        assert_eq!(image.data_uri(), "data:image/webp;base64,not-even-base64");
    }

    #[test]
    fn test_inline_normalization_is_idempotent() {
        let first = normalize_inline(Some("image/png"), "iVBORw0KGgo=");
        let second = normalize_inline(Some("image/png"), "iVBORw0KGgo=");
        assert_eq!(first.data_uri().as_bytes(), second.data_uri().as_bytes());
    }

    #[test]
    fn test_both_sources_resolve_to_inline() {
        let request = AnalyzeImageRequest {
            image_base64: Some("AAAA".to_string()),
            image_url: Some("https://example.com/cat.png".to_string()),
            image_mime_type: None,
        };
        assert_eq!(
            ImageInput::from_request(request).unwrap(),
            ImageInput::InlineBytes {
                mime_hint: None,
                base64_payload: "AAAA".to_string()
            }
        );
    }

    #[test]
    fn test_neither_source_is_input_error() {
        let err = ImageInput::from_request(AnalyzeImageRequest::default()).unwrap_err();
        assert_eq!(err, AnalysisError::no_image());
    }

    #[test]
    fn test_blank_values_count_as_absent() {
        let request = AnalyzeImageRequest {
            image_base64: Some(String::new()),
            image_url: Some("   ".to_string()),
            image_mime_type: Some("image/png".to_string()),
        };
        assert!(matches!(
            ImageInput::from_request(request),
            Err(AnalysisError::Input(_))
        ));
    }

    #[test]
    fn test_blank_inline_falls_through_to_url() {
        let request = AnalyzeImageRequest {
            image_base64: Some(" ".to_string()),
            image_url: Some(" https://example.com/a.jpg ".to_string()),
            image_mime_type: None,
        };
        assert_eq!(
            ImageInput::from_request(request).unwrap(),
            ImageInput::RemoteReference {
                url: "https://example.com/a.jpg".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_non_http_scheme_rejected_without_network() {
        let normalizer = InputNormalizer::new(&FetchConfig::default()).unwrap();
        let err = normalizer
            .normalize(ImageInput::RemoteReference {
                url: "file:///etc/passwd".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Input(_)));
    }
}
