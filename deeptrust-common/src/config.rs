//! Configuration file resolution and loading
//!
//! Config file priority:
//! 1. Command-line argument (highest priority)
//! 2. `DEEPTRUST_CONFIG` environment variable
//! 3. Per-module file in the user config dir (`~/.config/deeptrust/<module>.toml`)
//! 4. Compiled defaults (no file at all)
//!
//! A missing file is never fatal: the module logs a warning and starts on defaults.
//! A file that exists but does not parse is a configuration error.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DEEPTRUST_CONFIG";

/// Environment variable holding the inference API key
pub const API_KEY_ENV_VAR: &str = "DEEPTRUST_API_KEY";

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Locates the config file for one module
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    module_name: String,
}

impl ConfigResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
        }
    }

    /// Resolve the config path; `None` means no file could be located
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        dirs::config_dir().map(|d| d.join("deeptrust").join(format!("{}.toml", self.module_name)))
    }

    /// Resolve and load, falling back to `T::default()` when the file is absent
    pub fn load<T>(&self, cli_arg: Option<&Path>) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.resolve(cli_arg) {
            Some(path) => load_toml_or_default(&path),
            None => {
                warn!(
                    module = %self.module_name,
                    "Could not determine config directory, using compiled defaults"
                );
                Ok(T::default())
            }
        }
    }
}

/// Load a TOML file, or defaults if it does not exist
pub fn load_toml_or_default<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        warn!("Config file {} not found, using compiled defaults", path.display());
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolve the inference API key
///
/// **Priority:** ENV → TOML
pub fn resolve_api_key(toml_key: Option<&str>) -> Result<String> {
    let env_key = std::env::var(API_KEY_ENV_VAR).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_key.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "Inference API key found in both environment and TOML config. Using environment (highest priority)."
        );
    }

    if let Some(key) = env_key {
        info!("Inference API key loaded from environment variable");
        return Ok(key);
    }

    if let Some(key) = toml_key {
        info!("Inference API key loaded from TOML config");
        return Ok(key.to_string());
    }

    Err(Error::Config(format!(
        "Inference API key not configured. Set one of:\n\
         1. Environment: {API_KEY_ENV_VAR}=your-key-here\n\
         2. TOML config: [inference] api_key = \"your-key\""
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_level() {
        assert_eq!(LoggingConfig::default().level, "info");
        assert!(LoggingConfig::default().file.is_none());
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("sk-123"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   \t"));
    }

    #[test]
    fn test_cli_arg_wins() {
        let resolver = ConfigResolver::new("deeptrust-ai");
        let path = resolver.resolve(Some(Path::new("/tmp/explicit.toml")));
        assert_eq!(path, Some(PathBuf::from("/tmp/explicit.toml")));
    }
}
