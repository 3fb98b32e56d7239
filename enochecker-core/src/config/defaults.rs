//! Default configuration values for the checker service
//!
//! This module centralizes all default values to make them easy to find and modify.

use std::time::Duration;

// Server defaults
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

// Checker defaults
pub const DEFAULT_CHECKER_NAME: &str = "dummy";
pub const DEFAULT_SERVICE_PORT: u16 = 8080;
pub const DEFAULT_SERVICE_ID: u64 = 1;

// Connection defaults
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024; // 64KB
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096;
pub const MAX_BUFFER_CAPACITY: usize = 64 * 1024 * 1024; // 64MB

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Task client defaults
pub const DEFAULT_REQUEST_TIMEOUT_GRACE_MS: u64 = 500;

// Env var prefix for overrides
pub const ENV_PREFIX: &str = "ENOCHECKER_";

pub const fn duration_ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

pub const fn duration_secs(secs: u64) -> Duration {
    Duration::from_secs(secs)
}
