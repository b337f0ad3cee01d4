//! Shared error types

use thiserror::Error;

/// Errors at text/binary conversion boundaries
#[derive(Debug, Error)]
pub enum CodecError {
    /// A record produced by a transformer was not valid base64
    #[error("invalid base64 record: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A binary record was not valid UTF-8 where text was required
    #[error("record is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Error contract for source and writer plug-ins.
///
/// Plug-in hooks never panic across the component boundary; they return one
/// of these instead. Only [`PluginError::Fatal`] transitions the owning
/// component to `Failed` - everything else is logged and the record is
/// counted as lost.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Plug-in could not initialize (bad options, missing resource)
    #[error("initialization failed: {0}")]
    Init(String),

    /// A single record could not be delivered; the runloop continues
    #[error("write failed: {0}")]
    Write(String),

    /// A record failed plug-in validation and was dropped
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The plug-in lost its external connection and cannot continue.
    /// The owning component transitions to `Failed` for the supervisor
    /// to restart.
    #[error("plugin cannot continue: {0}")]
    Fatal(String),

    /// I/O error from the underlying transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PluginError {
    /// Create an initialization error
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a per-record write error
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Create a fatal error that takes the component down
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Whether this error should fail the whole component
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}
