//! Configuration for the checker service
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `ENOCHECKER_*` environment variables, then CLI flags applied by the
//! binary. Every section carries `#[serde(default)]`, so a file only needs
//! the keys it changes.
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0:8000"
//!
//! [checker]
//! name = "linestore"
//! service_port = 9000
//!
//! [connection]
//! connect_timeout = "3s"
//! buffer_capacity = 65536
//!
//! [logging]
//! level = "info,enochecker_core=debug"
//! format = "json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{EnoError, EnoResult};

pub mod client;
pub mod connection;
pub mod defaults;
pub mod logging;
pub mod server;

pub use client::ClientConfig;
pub use connection::ConnectionConfig;
pub use defaults::*;
pub use logging::{LogFormat, LoggingConfig};
pub use server::{CheckerSettings, ServerConfig};

/// Environment lookup keyed by the variable name without its prefix
pub(crate) type EnvLookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EnoConfig {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Checker selection
    pub checker: CheckerSettings,

    /// Connection tunables handed to checkers
    pub connection: ConnectionConfig,

    pub logging: LoggingConfig,

    /// Scheduler-side task client
    pub client: ClientConfig,
}

impl EnoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document without validating it
    pub fn from_toml_str(content: &str) -> EnoResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a TOML file, apply environment overrides and validate
    pub fn load(path: &Path) -> EnoResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EnoError::configuration("file", format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> EnoResult<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> EnoResult<()> {
        self.apply_overrides_from(&|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup of full variable names
    pub fn apply_overrides_from(
        &mut self,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> EnoResult<()> {
        let env = |key: &str| lookup(&format!("{}{}", ENV_PREFIX, key));
        self.server.apply_overrides(&env)?;
        self.checker.apply_overrides(&env)?;
        self.connection.apply_overrides(&env)?;
        self.logging.apply_overrides(&env)?;
        self.client.apply_overrides(&env)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> EnoResult<()> {
        self.server.validate()?;
        self.checker.validate()?;
        self.connection.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Loopback-bound configuration for tests
    pub fn test() -> Self {
        let mut config = Self::default();
        config.server.bind_address = "127.0.0.1:0".to_string();
        config.connection.connect_timeout = duration_secs(1);
        config
    }
}

/// Builder for EnoConfig
pub struct EnoConfigBuilder {
    config: EnoConfig,
}

impl EnoConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EnoConfig::default(),
        }
    }

    pub fn bind_address(mut self, addr: impl Into<String>) -> Self {
        self.config.server.bind_address = addr.into();
        self
    }

    pub fn checker(mut self, name: impl Into<String>) -> Self {
        self.config.checker.name = name.into();
        self
    }

    pub fn service_port(mut self, port: u16) -> Self {
        self.config.checker.service_port = port;
        self
    }

    pub fn connection(mut self, connection: ConnectionConfig) -> Self {
        self.config.connection = connection;
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    pub fn client(mut self, client: ClientConfig) -> Self {
        self.config.client = client;
        self
    }

    pub fn build(self) -> EnoResult<EnoConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for EnoConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a human-readable duration such as `250ms` or `3s`
pub(crate) fn parse_duration_override(key: &str, value: &str) -> EnoResult<Duration> {
    humantime_serde::re::humantime::parse_duration(value).map_err(|e| {
        EnoError::configuration(format!("{}{}", ENV_PREFIX, key), e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config_validation() {
        assert!(EnoConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = EnoConfigBuilder::new()
            .checker("linestore")
            .service_port(9000)
            .build()
            .unwrap();

        assert_eq!(config.checker.name, "linestore");
        assert_eq!(config.checker.service_port, 9000);
    }

    #[test]
    fn test_invalid_config() {
        let result = EnoConfigBuilder::new().bind_address("not an address").build();
        assert!(matches!(result, Err(EnoError::ConfigurationError { .. })));

        let result = EnoConfigBuilder::new().service_port(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EnoConfig::default();
        config
            .apply_overrides_from(&lookup(&[
                ("ENOCHECKER_CHECKER", "linestore"),
                ("ENOCHECKER_CONNECT_TIMEOUT", "250ms"),
                ("ENOCHECKER_LOG_FORMAT", "json"),
                ("ENOCHECKER_BUFFER_CAPACITY", "1024"),
            ]))
            .unwrap();

        assert_eq!(config.checker.name, "linestore");
        assert_eq!(config.connection.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.connection.buffer_capacity, 1024);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_bad_env_override_is_rejected() {
        let mut config = EnoConfig::default();
        let result = config.apply_overrides_from(&lookup(&[("ENOCHECKER_SERVICE_PORT", "http")]));
        assert!(result.is_err());

        let result = config.apply_overrides_from(&lookup(&[("ENOCHECKER_IO_TIMEOUT", "soon")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EnoConfig::from_toml_str(
            r#"
            [checker]
            name = "linestore"

            [connection]
            io_timeout = "2s"
            "#,
        )
        .unwrap();

        assert_eq!(config.checker.name, "linestore");
        assert_eq!(config.checker.service_port, DEFAULT_SERVICE_PORT);
        assert_eq!(config.connection.io_timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.server.bind_address, DEFAULT_BIND_ADDRESS);
    }
}
