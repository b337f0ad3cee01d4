//! Transformer error types

use thiserror::Error;

/// Errors from transformer creation or execution
#[derive(Debug, Error)]
pub enum TransformError {
    /// Factory rejected its configuration (the `info` portion of the route's
    /// transform selector)
    #[error("transformer configuration error: {0}")]
    Config(String),

    /// The transform itself failed; the record is dropped
    #[error("transform failed: {0}")]
    Failed(String),
}

impl TransformError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an execution error
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}
