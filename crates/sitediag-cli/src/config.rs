//! CLI configuration: an optional JSON file plus environment overrides.
//!
//! The file holds the runner settings and the module settings side by side:
//!
//! ```json
//! { "maxConcurrent": 2, "probeTimeoutMs": 3000, "jsCss": { "thresholdKB": 500 } }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sitediag_checks::ChecksConfig;
use sitediag_core::RunnerConfig;
use thiserror::Error;

pub const ENV_PROBE_TIMEOUT_MS: &str = "SITEDIAG_PROBE_TIMEOUT_MS";
pub const ENV_MAX_CONCURRENT: &str = "SITEDIAG_MAX_CONCURRENT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SitediagConfig {
    #[serde(flatten)]
    pub runner: RunnerConfig,
    #[serde(flatten)]
    pub checks: ChecksConfig,
}

impl SitediagConfig {
    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// File (when given) with process environment overrides applied.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Apply `SITEDIAG_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_PROBE_TIMEOUT_MS) {
            self.checks.probe_timeout_ms = parse_positive(ENV_PROBE_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_CONCURRENT) {
            self.runner.max_concurrent = parse_positive(ENV_MAX_CONCURRENT, &value)? as usize;
        }
        Ok(())
    }
}

fn parse_positive(var: &'static str, value: &str) -> ConfigResult<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: value.to_string(),
        }),
    }
}
