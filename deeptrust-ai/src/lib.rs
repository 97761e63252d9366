//! deeptrust-ai library interface
//!
//! Forensic image analysis service: normalizes an uploaded or linked image, asks a
//! multimodal model for a structured verdict and returns only validated results.

pub mod api;
pub mod config;
pub mod error;
pub mod services;

pub use crate::error::{AnalysisError, ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, Method};
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::AnalysisPipeline;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    /// Cancelled on shutdown; every in-flight analysis runs under a child token
    pub shutdown: CancellationToken,
    pub startup_time: DateTime<Utc>,
    /// Last analysis failure, reported by /health
    pub last_error: Arc<RwLock<Option<String>>>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(pipeline: AnalysisPipeline, shutdown: CancellationToken, max_body_bytes: usize) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            shutdown,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
            max_body_bytes,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    let body_limit = state.max_body_bytes;

    Router::new()
        .merge(api::analyze_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
