//! Logging configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::defaults::*;
use super::EnvLookup;
use crate::error::{EnoError, EnoResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = EnoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(EnoError::configuration(
                "logging.format",
                format!("unknown format '{}', expected text or json", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; RUST_LOG takes precedence when set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    pub(crate) fn apply_overrides(&mut self, env: &EnvLookup<'_>) -> EnoResult<()> {
        if let Some(level) = env("LOG_LEVEL") {
            self.level = level;
        }
        if let Some(format) = env("LOG_FORMAT") {
            self.format = format.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> EnoResult<()> {
        tracing_subscriber::EnvFilter::try_new(&self.level)
            .map_err(|e| EnoError::configuration("logging.level", e.to_string()))?;
        Ok(())
    }
}
