//=========================================================================
// Application Configuration
//=========================================================================
//
// YAML application settings, applied through `EngineBuilder::from_config`.
//
// ```yaml
// title: "My Scene"
// width: 1280
// height: 720
// tps: 60
// max_delta_ms: 100
// paused: false
// failure_policy: terminate      # or log_and_continue
// ```
//
// Every field is optional; missing fields take the defaults below.
// Values are validated on load so the builder never sees a bad one.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::Deserialize;
use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::scheduler::FailurePolicy;

//=== ConfigError =========================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

//=== AppConfig ===========================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,

    /// Logic ticks per second.
    pub tps: u32,

    /// Upper clamp on a single tick's delta, in milliseconds.
    pub max_delta_ms: u64,

    /// Start with the tree paused.
    pub paused: bool,

    pub failure_policy: FailurePolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Aetheric Scene".to_string(),
            width: 800,
            height: 600,
            tps: 60,
            max_delta_ms: 100,
            paused: false,
            failure_policy: FailurePolicy::Terminate,
        }
    }
}

impl AppConfig {
    /// Reads and validates a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        info!(target: "scheduler", "Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });
        if self.width == 0 || self.height == 0 {
            return invalid("width/height", "window size must be non-zero");
        }
        if !(1..=1000).contains(&self.tps) {
            return invalid("tps", "must be between 1 and 1000");
        }
        if self.max_delta_ms == 0 {
            return invalid("max_delta_ms", "must be positive");
        }
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
