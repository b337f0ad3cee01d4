//! Pipeline error types

use thiserror::Error;

/// Errors from a route registry fetch.
///
/// Every variant means the same thing to the router: keep the previous
/// route table and try again next cycle.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry endpoint could not be reached
    #[error("registry transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response was not the expected route document
    #[error("malformed route document: {0}")]
    Malformed(String),

    /// The registry answered with an error document
    #[error("registry error response: {0}")]
    Remote(String),
}

impl RegistryError {
    /// Create a malformed-document error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
