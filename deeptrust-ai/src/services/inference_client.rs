//! Inference endpoint client
//!
//! Speaks the OpenAI-compatible chat completions protocol. Transport failures and
//! 5xx answers are retried with exponential backoff up to `max_attempts`; 4xx
//! answers are returned at once. Every attempt has a hard timeout and the whole
//! call aborts as soon as the cancellation token fires.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use super::prompt_builder::AnalysisRequest;
use crate::config::InferenceConfig;
use crate::error::AnalysisError;

/// Undecoded response envelope from the inference endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RawModelResponse {
    pub body: Value,
}

/// Anything that can answer an [`AnalysisRequest`]
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn invoke(
        &self,
        request: AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<RawModelResponse, AnalysisError>;
}

/// Chat completions body for one analysis request
pub fn chat_payload(request: &AnalysisRequest, model: &str, temperature: f32) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": &*request.system_prompt },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": request.user_text },
                    { "type": "image_url", "image_url": { "url": request.image.data_uri() } },
                ],
            },
        ],
        "temperature": temperature,
    })
}

/// HTTP client for the configured inference endpoint
pub struct InferenceClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    max_attempts: u32,
    initial_backoff: Duration,
    referer: Option<String>,
    title: Option<String>,
}

impl InferenceClient {
    pub fn new(config: &InferenceConfig, api_key: String) -> deeptrust_common::Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| deeptrust_common::Error::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: config.timeout(),
            max_attempts: config.max_attempts.max(1),
            initial_backoff: config.initial_backoff(),
            referer: config.referer.clone(),
            title: config.title.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_once(&self, payload: &Value) -> Result<RawModelResponse, AnalysisError> {
        let mut request = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .json(payload);
        if let Some(referer) = &self.referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.title {
            request = request.header("X-Title", title);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        // A body that stalls or resets after the headers is a transport failure
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AnalysisError::Transport(format!("reading response body: {e}")))?;

        if !status.is_success() {
            return Err(AnalysisError::upstream(
                status.as_u16(),
                &String::from_utf8_lossy(&bytes),
            ));
        }

        let body = serde_json::from_slice::<Value>(&bytes)
            .map_err(|e| AnalysisError::Parse(format!("response envelope: {e}")))?;

        Ok(RawModelResponse { body })
    }
}

#[async_trait]
impl InferenceBackend for InferenceClient {
    async fn invoke(
        &self,
        request: AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<RawModelResponse, AnalysisError> {
        let payload = chat_payload(&request, &self.model, self.temperature);
        drop(request);

        let start_time = Instant::now();
        let mut attempt = 0;
        let mut backoff = self.initial_backoff;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
                outcome = self.send_once(&payload) => outcome,
            };

            match outcome {
                Ok(response) => {
                    tracing::info!(
                        model = %self.model,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Inference call succeeded"
                    );
                    return Ok(response);
                }
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    tracing::warn!(
                        model = %self.model,
                        attempt,
                        max_attempts = self.max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "Inference call failed, will retry after backoff"
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(AnalysisError::Cancelled),
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = backoff.saturating_mul(2);
                }
                Err(err) => {
                    tracing::error!(
                        model = %self.model,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        kind = err.kind(),
                        error = %err,
                        "Inference call failed"
                    );
                    return Err(err);
                }
            }
        }
    }
}
