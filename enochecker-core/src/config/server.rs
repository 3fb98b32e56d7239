//! HTTP server and checker selection configuration

use serde::{Deserialize, Serialize};

use super::defaults::*;
use super::EnvLookup;
use crate::error::{EnoError, EnoResult};

/// HTTP endpoint the scheduler talks to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

impl ServerConfig {
    pub(crate) fn apply_overrides(&mut self, env: &EnvLookup<'_>) -> EnoResult<()> {
        if let Some(addr) = env("BIND_ADDRESS") {
            self.bind_address = addr;
        }
        Ok(())
    }

    pub fn validate(&self) -> EnoResult<()> {
        self.bind_address
            .parse::<std::net::SocketAddr>()
            .map_err(|e| EnoError::configuration("server.bind_address", e.to_string()))?;
        Ok(())
    }
}

/// Which checker runs in this process and where its service listens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CheckerSettings {
    /// Registry key of the checker implementation
    pub name: String,

    /// Port of the team service the checker probes
    pub service_port: u16,

    /// Service id used when computing task chain ids
    pub service_id: u64,
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_CHECKER_NAME.to_string(),
            service_port: DEFAULT_SERVICE_PORT,
            service_id: DEFAULT_SERVICE_ID,
        }
    }
}

impl CheckerSettings {
    pub(crate) fn apply_overrides(&mut self, env: &EnvLookup<'_>) -> EnoResult<()> {
        if let Some(name) = env("CHECKER") {
            self.name = name;
        }
        if let Some(port) = env("SERVICE_PORT") {
            self.service_port = port.parse()?;
        }
        if let Some(id) = env("SERVICE_ID") {
            self.service_id = id.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> EnoResult<()> {
        if self.name.trim().is_empty() {
            return Err(EnoError::configuration("checker.name", "must not be empty"));
        }
        if self.service_port == 0 {
            return Err(EnoError::configuration("checker.service_port", "must be non-zero"));
        }
        Ok(())
    }
}
