//! Configuration for the deeptrust-ai service
//!
//! Bootstrap-only TOML configuration; every field has a compiled default so the
//! service starts without a file. Only the inference API key has no default (see
//! [`deeptrust_common::config::resolve_api_key`]).
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1"
//! port = 5730
//!
//! [inference]
//! endpoint = "https://ai.gateway.lovable.dev/v1/chat/completions"
//! model = "google/gemini-2.5-flash"
//! timeout_secs = 30
//! max_attempts = 2
//!
//! [fetch]
//! timeout_secs = 20
//! max_image_bytes = 20971520
//!
//! [logging]
//! level = "info"
//! ```

use deeptrust_common::config::LoggingConfig;
use deeptrust_common::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::services::rubric::DEFAULT_RUBRIC;

pub const DEFAULT_PORT: u16 = 5730;
pub const DEFAULT_INFERENCE_ENDPOINT: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

/// Desktop Chrome identity presented to image hosts
pub const DEFAULT_BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Upper bound for request bodies; inline images arrive base64-encoded
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Outbound inference endpoint settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// OpenAI-compatible chat completions URL
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    /// Fallback when DEEPTRUST_API_KEY is not set
    pub api_key: Option<String>,
    /// Hard timeout per attempt
    pub timeout_secs: u64,
    /// Total attempts including the first; transport errors and 5xx only
    pub max_attempts: u32,
    /// Delay before the second attempt, doubled for each further one
    pub initial_backoff_ms: u64,
    /// Sent as `HTTP-Referer` when set
    pub referer: Option<String>,
    /// Sent as `X-Title` when set
    pub title: Option<String>,
    /// Replaces the compiled forensic rubric
    pub rubric_path: Option<PathBuf>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_INFERENCE_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            api_key: None,
            timeout_secs: 30,
            max_attempts: 2,
            initial_backoff_ms: 500,
            referer: None,
            title: Some("AI Image Detector".to_string()),
            rubric_path: None,
        }
    }
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Rubric text: the override file if configured, otherwise the compiled default
    pub fn load_rubric(&self) -> Result<String> {
        match &self.rubric_path {
            Some(path) => {
                let rubric = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Read rubric {} failed: {}", path.display(), e))
                })?;
                if rubric.trim().is_empty() {
                    return Err(Error::Config(format!("Rubric file {} is empty", path.display())));
                }
                info!("Loaded forensic rubric from {}", path.display());
                Ok(rubric)
            }
            None => Ok(DEFAULT_RUBRIC.to_string()),
        }
    }
}

/// Remote image retrieval settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Remote images larger than this are refused
    pub max_image_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            user_agent: DEFAULT_BROWSER_USER_AGENT.to_string(),
            max_image_bytes: 20 * 1024 * 1024,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

impl TomlConfig {
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        self
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}
