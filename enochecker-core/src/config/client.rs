//! Task client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::defaults::*;
use super::{parse_duration_override, EnvLookup};
use crate::error::EnoResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Added to a task's timeout to get the HTTP request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout_grace: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_grace: duration_ms(DEFAULT_REQUEST_TIMEOUT_GRACE_MS),
        }
    }
}

impl ClientConfig {
    pub(crate) fn apply_overrides(&mut self, env: &EnvLookup<'_>) -> EnoResult<()> {
        if let Some(value) = env("REQUEST_TIMEOUT_GRACE") {
            self.request_timeout_grace = parse_duration_override("REQUEST_TIMEOUT_GRACE", &value)?;
        }
        Ok(())
    }
}
