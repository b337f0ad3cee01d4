//! Relay - Transform
//!
//! Record transformers rewrite text records in-flight between a source and a
//! destination writer. Binary records reach transformers base64-encoded, so a
//! single text-shaped trait covers both payload families.
//!
//! # Design Principles
//!
//! - **Thread-safe**: transformers may be called concurrently from several
//!   router workers.
//! - **Nothing-to-forward is a value**: a transformer may return `None` to
//!   swallow a record; an `Err` means the transform itself broke and the
//!   record is dropped with a logged failure.
//! - **Config-driven**: transformers are created through the
//!   [`TransformerRegistry`], an explicit factory map keyed by implementation
//!   identifier. The route table selects a transformer by logical name and
//!   passes the `info` portion of its `"name:info"` selector to the factory.
//!
//! # Adding a New Transformer
//!
//! 1. Implement [`Transformer`] on your struct.
//! 2. Implement [`TransformerFactory`], parsing the route's `info` string.
//! 3. Register it in [`default_registry`] (or your own registry) under its
//!    implementation identifier.

mod error;
mod noop;
pub mod registry;
mod reverse;

pub use error::TransformError;
pub use noop::NoopTransformer;
pub use registry::{TransformerFactory, TransformerRegistry};
pub use reverse::ReverseTransformer;

use async_trait::async_trait;

/// Result type for transformer operations
pub type TransformResult<T> = Result<T, TransformError>;

/// A record rewriter applied between a source and a destination writer.
///
/// Both methods receive the originating `(source, topic)` pair for
/// transformers that key their behavior on provenance. Returning `Ok(None)`
/// means "nothing to forward" and the caller reports the write as rejected;
/// returning `Err` means the transform failed and the record is lost with a
/// logged warning.
#[async_trait]
pub trait Transformer: Send + Sync + std::fmt::Debug {
    /// Implementation identifier, for logging
    fn name(&self) -> &str;

    /// Transform a single record
    async fn transform_one(
        &self,
        source: &str,
        topic: &str,
        record: String,
    ) -> TransformResult<Option<String>>;

    /// Transform an ordered sequence of records.
    ///
    /// The default maps [`transform_one`](Self::transform_one) over the
    /// sequence, dropping records that transform to `None`.
    async fn transform_many(
        &self,
        source: &str,
        topic: &str,
        records: Vec<String>,
    ) -> TransformResult<Option<Vec<String>>> {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            if let Some(rewritten) = self.transform_one(source, topic, record).await? {
                out.push(rewritten);
            }
        }
        Ok(Some(out))
    }
}

/// Create a registry with all built-in transformers registered
///
/// Includes:
/// - `noop` - pass-through
/// - `reverse` - reverses each record's characters (smoke-testing flows)
pub fn default_registry() -> TransformerRegistry {
    let mut registry = TransformerRegistry::new();
    registry.register("noop", registry::NoopFactory);
    registry.register("reverse", registry::ReverseFactory);
    registry
}
