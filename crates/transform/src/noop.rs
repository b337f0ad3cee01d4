//! Pass-through transformer
//!
//! Forwards every record unchanged. Useful as a placeholder route transform
//! and for measuring pipeline overhead.

use async_trait::async_trait;

use crate::{TransformResult, Transformer};

/// A transformer that forwards records unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransformer;

impl NoopTransformer {
    /// Create a new noop transformer
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transformer for NoopTransformer {
    fn name(&self) -> &str {
        "noop"
    }

    async fn transform_one(
        &self,
        _source: &str,
        _topic: &str,
        record: String,
    ) -> TransformResult<Option<String>> {
        Ok(Some(record))
    }

    async fn transform_many(
        &self,
        _source: &str,
        _topic: &str,
        records: Vec<String>,
    ) -> TransformResult<Option<Vec<String>>> {
        Ok(Some(records))
    }
}
