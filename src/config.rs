//! Runtime configuration from the environment and an optional `.env` file.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::generator::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT, GeneratorConfig};

pub const DEFAULT_DB_PATH: &str = "smritify.db";
pub const DEFAULT_LOG_PATH: &str = "smritify.log";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub generator: GeneratorConfig,
}

impl Config {
    /// Load `.env` if present, then read settings from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) => debug!("No .env file loaded: {}", e),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = match non_empty("SMRITIFY_REQUEST_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "SMRITIFY_REQUEST_TIMEOUT_SECS",
                        value,
                    });
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            db_path: non_empty("SMRITIFY_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            log_path: non_empty("SMRITIFY_LOG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH)),
            generator: GeneratorConfig {
                api_key: lookup("OPENAI_API_KEY"),
                base_url: non_empty("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
                model: non_empty("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
                timeout,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            generator: GeneratorConfig::default(),
        }
    }
}
