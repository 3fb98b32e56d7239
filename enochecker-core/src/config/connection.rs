//! Pipelined connection configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::defaults::*;
use super::{parse_duration_override, EnvLookup};
use crate::error::{EnoError, EnoResult};

/// Tunables applied to every connection a checker opens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Upper bound on TCP connect, on top of the task deadline
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Receive buffer capacity in bytes; the fill loop stops reading when full
    pub buffer_capacity: usize,

    /// Maximum bytes per socket read
    pub read_chunk_size: usize,

    /// Optional per-operation limit for send/receive
    #[serde(default, with = "humantime_serde")]
    pub io_timeout: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: duration_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            io_timeout: None,
        }
    }
}

impl ConnectionConfig {
    pub(crate) fn apply_overrides(&mut self, env: &EnvLookup<'_>) -> EnoResult<()> {
        if let Some(value) = env("CONNECT_TIMEOUT") {
            self.connect_timeout = parse_duration_override("CONNECT_TIMEOUT", &value)?;
        }
        if let Some(value) = env("BUFFER_CAPACITY") {
            self.buffer_capacity = value.parse()?;
        }
        if let Some(value) = env("READ_CHUNK_SIZE") {
            self.read_chunk_size = value.parse()?;
        }
        if let Some(value) = env("IO_TIMEOUT") {
            self.io_timeout = Some(parse_duration_override("IO_TIMEOUT", &value)?);
        }
        Ok(())
    }

    pub fn validate(&self) -> EnoResult<()> {
        if self.connect_timeout.is_zero() {
            return Err(EnoError::configuration(
                "connection.connect_timeout",
                "must be positive",
            ));
        }
        if self.buffer_capacity == 0 || self.buffer_capacity > MAX_BUFFER_CAPACITY {
            return Err(EnoError::configuration(
                "connection.buffer_capacity",
                format!("must be between 1 and {} bytes", MAX_BUFFER_CAPACITY),
            ));
        }
        if self.read_chunk_size == 0 {
            return Err(EnoError::configuration(
                "connection.read_chunk_size",
                "must be non-zero",
            ));
        }
        if matches!(self.io_timeout, Some(t) if t.is_zero()) {
            return Err(EnoError::configuration(
                "connection.io_timeout",
                "must be positive when set",
            ));
        }
        Ok(())
    }
}
