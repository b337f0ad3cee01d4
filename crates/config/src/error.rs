//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse JSON (including instance entries missing `type`)
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// An instance references a logical type that is not declared in `Types`
    #[error("{component} '{name}' references unknown type '{kind}'")]
    UnknownType {
        /// Component kind ("source" or "writer")
        component: &'static str,
        /// Instance name
        name: String,
        /// The undeclared logical type
        kind: String,
    },

    /// The HTTP registry is selected but no URL is configured
    #[error("registry type 'http' requires a 'url'")]
    MissingRegistryUrl,
}

impl ConfigError {
    /// Create an UnknownType error
    pub fn unknown_type(
        component: &'static str,
        name: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self::UnknownType {
            component,
            name: name.into(),
            kind: kind.into(),
        }
    }
}
