//! Configuration for the deeptrust-ui client
//!
//! ```toml
//! server_url = "http://127.0.0.1:5730"
//! tick_interval_ms = 1500
//!
//! [logging]
//! level = "warn"
//! ```

use deeptrust_common::config::LoggingConfig;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5730";

/// Client configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the deeptrust-ai service
    pub server_url: String,
    /// Period of the status-label ticker
    pub tick_interval_ms: u64,
    /// Whole-request timeout; the service retries internally, so this is generous
    pub request_timeout_secs: u64,
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            tick_interval_ms: 1500,
            request_timeout_secs: 120,
            logging: LoggingConfig {
                level: "warn".to_string(),
                file: None,
            },
        }
    }
}

impl ClientConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
