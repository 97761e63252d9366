//! Multimodal request construction
//!
//! Pure and deterministic: the same image and rubric always produce the same
//! request.

use std::sync::Arc;

use super::input_normalizer::CanonicalImage;
use super::rubric::{DEFAULT_RUBRIC, USER_INSTRUCTION};

/// One analysis request, consumed by a single inference call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub system_prompt: Arc<str>,
    pub user_text: String,
    pub image: CanonicalImage,
}

/// Pairs the forensic rubric with a normalized image
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    rubric: Arc<str>,
}

impl PromptBuilder {
    pub fn new(rubric: impl Into<Arc<str>>) -> Self {
        Self {
            rubric: rubric.into(),
        }
    }

    pub fn rubric(&self) -> &str {
        &self.rubric
    }

    pub fn build(&self, image: CanonicalImage) -> AnalysisRequest {
        AnalysisRequest {
            system_prompt: Arc::clone(&self.rubric),
            user_text: USER_INSTRUCTION.to_string(),
            image,
        }
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_RUBRIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::input_normalizer::normalize_inline;

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::default();
        let a = builder.build(normalize_inline(None, "AAAA"));
        let b = builder.build(normalize_inline(None, "AAAA"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_rubric_does_not_vary_by_input() {
        let builder = PromptBuilder::new("custom rubric");
        let jpeg = builder.build(normalize_inline(None, "AAAA"));
        let png = builder.build(normalize_inline(Some("image/png"), "BBBB"));
        assert_eq!(&*jpeg.system_prompt, "custom rubric");
        assert_eq!(jpeg.system_prompt, png.system_prompt);
        assert_eq!(jpeg.user_text, USER_INSTRUCTION);
        assert_eq!(png.image.data_uri(), "data:image/png;base64,BBBB");
    }
}
