//! Error types for cooler-core

use thiserror::Error;

/// Result type alias using cooler-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Cooler
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid component definition
    #[error("Invalid component '{id}': {reason}")]
    InvalidComponent { id: String, reason: String },

    /// Duplicate component id
    #[error("Component '{id}' is defined more than once")]
    DuplicateComponent { id: String },

    /// Unknown component id
    #[error("Unknown component: {id}")]
    UnknownComponent { id: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid component error
    pub fn invalid_component(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidComponent {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a duplicate component error
    pub fn duplicate_component(id: impl Into<String>) -> Self {
        Self::DuplicateComponent { id: id.into() }
    }

    /// Create an unknown component error
    pub fn unknown_component(id: impl Into<String>) -> Self {
        Self::UnknownComponent { id: id.into() }
    }
}
