//! Error conversion implementations for EnoError
//!
//! External error types convert into harness faults. None of them convert
//! into `Offline` or `Mumble`: a checker that lets a raw I/O error escape has
//! a bug, and the dispatcher reports it as an internal error. Socket failures
//! that should count against the service go through the pipelined
//! connection, which normalizes them itself.

use super::types::EnoError;

impl From<std::io::Error> for EnoError {
    fn from(err: std::io::Error) -> Self {
        EnoError::IoError(Box::new(err))
    }
}

impl From<serde_json::Error> for EnoError {
    fn from(err: serde_json::Error) -> Self {
        EnoError::JsonError(Box::new(err))
    }
}

impl From<reqwest::Error> for EnoError {
    fn from(err: reqwest::Error) -> Self {
        EnoError::Http(Box::new(err))
    }
}

impl From<toml::de::Error> for EnoError {
    fn from(err: toml::de::Error) -> Self {
        EnoError::ConfigurationError {
            component: "toml".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<std::net::AddrParseError> for EnoError {
    fn from(err: std::net::AddrParseError) -> Self {
        EnoError::ConfigurationError {
            component: "network_address".to_string(),
            message: format!("Invalid network address: {}", err),
        }
    }
}

impl From<std::num::ParseIntError> for EnoError {
    fn from(err: std::num::ParseIntError) -> Self {
        EnoError::ConfigurationError {
            component: "numeric_value".to_string(),
            message: format!("Invalid numeric value: {}", err),
        }
    }
}

impl From<tokio::task::JoinError> for EnoError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            EnoError::Internal {
                message: "Task was cancelled".to_string(),
            }
        } else if err.is_panic() {
            EnoError::Internal {
                message: "Task panicked".to_string(),
            }
        } else {
            EnoError::Internal {
                message: format!("Task join failed: {}", err),
            }
        }
    }
}
