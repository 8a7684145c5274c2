//! Error types and handling for the RCE sensor
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for RCE sensor operations
pub type Result<T> = std::result::Result<T, RceError>;

/// Main error type for the RCE sensor
#[derive(Debug, Error)]
pub enum RceError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Network-related errors (PSE endpoint unreachable, TLS, DNS)
    #[error("Network error: {message}")]
    Network { message: String },

    /// CSV decoding errors
    #[error("CSV error: {message}")]
    Csv { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// HTTP/Web server errors
    #[error("Web server error: {message}")]
    Web { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl RceError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        RceError::Config {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        RceError::Network {
            message: message.into(),
        }
    }

    /// Create a new CSV error
    pub fn csv<S: Into<String>>(message: S) -> Self {
        RceError::Csv {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        RceError::Io {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        RceError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        RceError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        RceError::Web {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        RceError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for RceError {
    fn from(err: std::io::Error) -> Self {
        RceError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for RceError {
    fn from(err: serde_yaml::Error) -> Self {
        RceError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for RceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RceError::timeout(err.to_string())
        } else {
            RceError::network(err.to_string())
        }
    }
}
