//! Error types for application operations.
//!
//! Configuration parsing never fails (accessors degrade to fallbacks), so
//! the errors here cover lifecycle misuse and failures reported by the host
//! controller while registering or subscribing.

use thiserror::Error;

/// Result type alias for application operations.
pub type VeltResult<T> = Result<T, VeltError>;

/// Errors that can occur while driving an application.
#[derive(Debug, Error)]
pub enum VeltError {
    /// The application was activated while already active.
    #[error("Application '{app}' is already active")]
    AlreadyActive {
        /// The application name.
        app: String,
    },

    /// The application was deactivated while inactive.
    #[error("Application '{app}' is not active")]
    NotActive {
        /// The application name.
        app: String,
    },

    /// A host service refused a registration request.
    #[error("Registration with {service} failed: {message}")]
    Registration {
        /// The host service (e.g., "core", "netcfg").
        service: String,
        /// Error message.
        message: String,
    },

    /// Network configuration document could not be used.
    #[error("Invalid configuration for {field}: {message}")]
    InvalidConfig {
        /// The field or document section that failed.
        field: String,
        /// Error message.
        message: String,
    },

    /// The event worker terminated abnormally.
    #[error("Event worker failed: {message}")]
    Worker {
        /// Error message.
        message: String,
    },
}

impl VeltError {
    /// Creates an already-active error.
    pub fn already_active(app: impl Into<String>) -> Self {
        Self::AlreadyActive { app: app.into() }
    }

    /// Creates a not-active error.
    pub fn not_active(app: impl Into<String>) -> Self {
        Self::NotActive { app: app.into() }
    }

    /// Creates a registration error.
    pub fn registration(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Registration {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a worker error.
    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }

    /// Returns true if this error comes from calling a lifecycle
    /// operation in the wrong state.
    pub fn is_lifecycle_misuse(&self) -> bool {
        matches!(
            self,
            VeltError::AlreadyActive { .. } | VeltError::NotActive { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VeltError::already_active("org.onosproject.velt");
        assert_eq!(
            err.to_string(),
            "Application 'org.onosproject.velt' is already active"
        );
    }

    #[test]
    fn test_registration_error() {
        let err = VeltError::registration("netcfg", "duplicate config key veltcfg");
        assert_eq!(
            err.to_string(),
            "Registration with netcfg failed: duplicate config key veltcfg"
        );
    }

    #[test]
    fn test_invalid_config_error() {
        let err = VeltError::invalid_config("apps", "expected an object");
        assert!(err.to_string().contains("apps"));
        assert!(err.to_string().contains("expected an object"));
    }

    #[test]
    fn test_is_lifecycle_misuse() {
        assert!(VeltError::already_active("a").is_lifecycle_misuse());
        assert!(VeltError::not_active("a").is_lifecycle_misuse());
        assert!(!VeltError::worker("panicked").is_lifecycle_misuse());
        assert!(!VeltError::registration("core", "down").is_lifecycle_misuse());
    }
}
