//! Route target resolution
//!
//! When the table reconciles descriptors it must resolve instance names to
//! live components. That resolution is a seam rather than a global lookup:
//! the engine's component catalog implements it in production, and tests
//! supply stubs.

use std::sync::Arc;

use relay_transform::Transformer;
use relay_writers::Writer;

/// Resolves route descriptor names to live pipeline components
pub trait RouteTargets: Send + Sync {
    /// Whether a source instance with this name exists
    fn has_source(&self, name: &str) -> bool;

    /// The writer instance with this name, if any
    fn writer(&self, name: &str) -> Option<Arc<Writer>>;

    /// Whether a transformer kind with this logical name is declared
    fn has_transformer_kind(&self, kind: &str) -> bool;

    /// Build a transformer of the given logical kind with the route's info
    /// string. `None` means construction failed; the caller degrades the
    /// route to a pass-through.
    fn transformer(&self, kind: &str, info: &str) -> Option<Arc<dyn Transformer>>;
}
