//! Core error types for the checker harness

use thiserror::Error;

/// Error type for harness and checker operations
#[derive(Error, Debug)]
pub enum EnoError {
    // Service signals
    /// The remote service is unreachable or stopped responding
    #[error("Service offline: {message}")]
    Offline { message: String },

    /// The remote service responded but failed an expected check
    #[error("Service mumble: {message}")]
    Mumble { message: String },

    // Configuration & input
    #[error("Configuration error in {component}: {message}")]
    ConfigurationError { component: String, message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Checker not found: {name} (available: {available})")]
    CheckerNotFound { name: String, available: String },

    // Network & serialization
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] Box<reqwest::Error>),

    #[error("JSON error: {0}")]
    JsonError(#[from] Box<serde_json::Error>),

    #[error("IO error: {0}")]
    IoError(#[from] Box<std::io::Error>),

    // Internal
    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type EnoResult<T> = std::result::Result<T, EnoError>;
