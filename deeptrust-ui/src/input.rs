//! Submission assembly
//!
//! A submission pairs the request body with a preview reference: the file's own
//! data URI for uploads, the URL itself for remote images. Files that are not
//! images are refused before anything is sent.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use deeptrust_common::api::AnalyzeImageRequest;
use deeptrust_common::{Error, Result};

/// Image MIME types by lowercase file extension
const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("avif", "image/avif"),
    ("heic", "image/heic"),
    ("svg", "image/svg+xml"),
];

/// One image ready to hand to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub request: AnalyzeImageRequest,
    pub preview_uri: String,
}

impl Submission {
    /// Inline upload from raw bytes with a known MIME type
    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Result<Self> {
        if !is_image_mime(mime_type) {
            return Err(Error::InvalidInput(format!(
                "Not an image ({mime_type}); choose an image file"
            )));
        }

        let payload = BASE64.encode(bytes);
        let preview_uri = format!("data:{mime_type};base64,{payload}");
        Ok(Self {
            request: AnalyzeImageRequest::inline(payload, Some(mime_type.to_string())),
            preview_uri,
        })
    }

    /// Inline upload read from disk
    ///
    /// The type is sniffed from the content, falling back to the extension.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let mime_type = infer::get(&bytes)
            .map(|kind| kind.mime_type())
            .or_else(|| mime_from_extension(path))
            .ok_or_else(|| {
                Error::InvalidInput(format!("{} is not a recognised image file", path.display()))
            })?;
        tracing::debug!(path = %path.display(), mime_type, bytes = bytes.len(), "Read image file");
        Self::from_bytes(&bytes, mime_type)
    }

    /// Remote image; the URL doubles as the preview
    pub fn from_url(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidInput("Enter an image URL".to_string()));
        }
        Ok(Self {
            request: AnalyzeImageRequest::remote(url),
            preview_uri: url.to_string(),
        })
    }
}

pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type.trim().to_ascii_lowercase().starts_with("image/")
}

pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}
