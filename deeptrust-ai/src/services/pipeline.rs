//! Analysis pipeline
//!
//! normalize -> build prompt -> invoke -> validate. Each stage is awaited in
//! order; the first failure ends the run and no partial result escapes.

use std::sync::Arc;
use std::time::Instant;

use deeptrust_common::api::AnalyzeImageRequest;
use deeptrust_common::AnalysisResult;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::input_normalizer::{ImageInput, InputNormalizer};
use super::inference_client::InferenceBackend;
use super::prompt_builder::PromptBuilder;
use super::response_validator;
use crate::error::AnalysisError;

/// Stateless between calls; one instance serves all requests
pub struct AnalysisPipeline {
    normalizer: InputNormalizer,
    prompts: PromptBuilder,
    backend: Arc<dyn InferenceBackend>,
}

impl AnalysisPipeline {
    pub fn new(
        normalizer: InputNormalizer,
        prompts: PromptBuilder,
        backend: Arc<dyn InferenceBackend>,
    ) -> Self {
        Self {
            normalizer,
            prompts,
            backend,
        }
    }

    pub async fn analyze(
        &self,
        request: AnalyzeImageRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError> {
        let analysis_id = Uuid::new_v4();
        let start_time = Instant::now();

        let outcome = self.run(analysis_id, request, cancel).await;
        let elapsed_ms = start_time.elapsed().as_millis() as u64;

        match &outcome {
            Ok(result) => tracing::info!(
                %analysis_id,
                verdict = %result.verdict,
                confidence = result.confidence,
                issues = result.issues.len(),
                elapsed_ms,
                "Analysis completed"
            ),
            Err(err) => tracing::warn!(
                %analysis_id,
                kind = err.kind(),
                error = %err,
                elapsed_ms,
                "Analysis failed"
            ),
        }

        outcome
    }

    async fn run(
        &self,
        analysis_id: Uuid,
        request: AnalyzeImageRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, AnalysisError> {
        let input = ImageInput::from_request(request)?;
        tracing::debug!(%analysis_id, source = input.source(), "Normalizing image input");

        let image = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
            image = self.normalizer.normalize(input) => image?,
        };

        tracing::debug!(
            %analysis_id,
            content_type = image.content_type(),
            data_uri_len = image.data_uri().len(),
            "Image normalized"
        );

        let request = self.prompts.build(image);
        let raw = self.backend.invoke(request, cancel).await?;

        response_validator::validate(&raw)
    }
}
