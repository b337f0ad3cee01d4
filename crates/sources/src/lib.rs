//! Relay - Sources
//!
//! The producing half of the pipeline: a source pulls records from an
//! external input and writes them into the router.
//!
//! # Architecture
//!
//! [`Source`] owns the lifecycle state machine and one producer task;
//! the injected [`SourcePlugin`] supplies the actual input behavior. The
//! plug-in's `run` receives a [`SourceContext`] carrying the instance name,
//! a liveness probe, and the record sink, and is expected to produce until
//! the probe goes false.
//!
//! Unlike writers, sources own no queue: they write straight into the
//! router's staging pool.

mod interval;
pub mod registry;
mod source;

pub use interval::IntervalPlugin;
pub use registry::{SourceFactory, SourceRegistry};
pub use source::{Source, SourceContext, SourcePlugin};

/// Instance-specific options handed to a plug-in at initialization
pub type PluginOptions = serde_json::Map<String, serde_json::Value>;
