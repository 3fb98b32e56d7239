//! Constructor methods and predicates for EnoError

use super::types::EnoError;

impl EnoError {
    /// Create an offline signal carrying a scoreboard-visible message
    ///
    /// # Examples
    /// ```rust
    /// use enochecker_core::error::EnoError;
    ///
    /// let err = EnoError::offline("Could not establish TCP connection");
    /// assert!(err.is_offline());
    /// ```
    pub fn offline(message: impl Into<String>) -> Self {
        EnoError::Offline {
            message: message.into(),
        }
    }

    /// Create a mumble signal carrying a scoreboard-visible message
    ///
    /// The message ends up on the public scoreboard, so it must not contain
    /// flags or other secrets.
    pub fn mumble(message: impl Into<String>) -> Self {
        EnoError::Mumble {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        EnoError::Internal {
            message: message.into(),
        }
    }

    /// Create a configuration error for a named component
    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        EnoError::ConfigurationError {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a validation error for an input field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EnoError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        EnoError::Network {
            message: message.into(),
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, EnoError::Offline { .. })
    }

    pub fn is_mumble(&self) -> bool {
        matches!(self, EnoError::Mumble { .. })
    }

    /// Whether this error is one of the two service signals
    pub fn is_service_signal(&self) -> bool {
        self.is_offline() || self.is_mumble()
    }
}
