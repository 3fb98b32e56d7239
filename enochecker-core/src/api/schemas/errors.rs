//! Error response body for rejected requests

use serde::{Deserialize, Serialize};

use crate::error::EnoError;

/// Body of every non-2xx response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Matches the HTTP status code
    pub code: u16,

    /// Error category
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Offending field for validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Timestamp when error occurred (ISO 8601)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorResponse {
    pub fn new(code: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            error: error.into(),
            message: message.into(),
            field: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl From<&EnoError> for ErrorResponse {
    fn from(err: &EnoError) -> Self {
        match err {
            EnoError::Validation { field, message } => {
                ErrorResponse::new(400, "validation_error", message.clone())
                    .with_field(field.clone())
            }
            EnoError::JsonError(e) => ErrorResponse::new(400, "malformed_request", e.to_string()),
            EnoError::ConfigurationError { .. } => {
                ErrorResponse::new(400, "configuration_error", err.to_string())
            }
            EnoError::CheckerNotFound { .. } => {
                ErrorResponse::new(404, "not_found", err.to_string())
            }
            // Internal detail stays in the logs
            _ => ErrorResponse::new(500, "internal_error", "Internal server error"),
        }
    }
}
