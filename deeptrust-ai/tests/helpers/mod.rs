//! Test helper utilities shared by the deeptrust-ai integration tests
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use deeptrust_ai::config::FetchConfig;
use deeptrust_ai::services::{
    AnalysisPipeline, AnalysisRequest, InferenceBackend, InputNormalizer, PromptBuilder,
    RawModelResponse,
};
use deeptrust_ai::{AnalysisError, AppState};
use serde_json::json;
use tokio_util::sync::CancellationToken;

pub const REAL_RESULT: &str = r#"{"verdict":"Real","confidence":82,"summary":"Natural sensor noise and consistent lighting.","issues":[],"clear":["Lighting Consistency","Edge Quality"]}"#;

/// Inference backend with a scripted answer
pub struct FakeBackend {
    answer: Result<String, AnalysisError>,
    calls: AtomicUsize,
    requests: Mutex<Vec<AnalysisRequest>>,
}

impl FakeBackend {
    /// Answers every call with this message content
    pub fn replying(content: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(content.to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Fails every call with this error
    pub fn failing(err: AnalysisError) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(err),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<AnalysisRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl InferenceBackend for FakeBackend {
    async fn invoke(
        &self,
        request: AnalysisRequest,
        _cancel: &CancellationToken,
    ) -> Result<RawModelResponse, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        match &self.answer {
            Ok(content) => Ok(RawModelResponse {
                body: json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }),
            }),
            Err(err) => Err(err.clone()),
        }
    }
}

pub fn test_pipeline(backend: Arc<FakeBackend>) -> AnalysisPipeline {
    AnalysisPipeline::new(
        InputNormalizer::new(&FetchConfig::default()).unwrap(),
        PromptBuilder::default(),
        backend,
    )
}

pub fn test_app_state(backend: Arc<FakeBackend>) -> AppState {
    AppState::new(test_pipeline(backend), CancellationToken::new(), 1024 * 1024)
}

/// Serve `router` on an ephemeral local port
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}
