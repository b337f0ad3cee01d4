//! Character-reversing transformer
//!
//! Reverses each record's characters. Its output is trivially checkable at
//! the destination, which makes it the standard transformer for exercising
//! transform routes end to end.

use async_trait::async_trait;

use crate::{TransformResult, Transformer};

/// A transformer that reverses each record
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseTransformer;

impl ReverseTransformer {
    /// Create a new reverse transformer
    #[inline]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transformer for ReverseTransformer {
    fn name(&self) -> &str {
        "reverse"
    }

    async fn transform_one(
        &self,
        _source: &str,
        _topic: &str,
        record: String,
    ) -> TransformResult<Option<String>> {
        Ok(Some(record.chars().rev().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reverses_single_record() {
        let t = ReverseTransformer::new();
        let out = t
            .transform_one("src", "topic", "abc".to_string())
            .await
            .unwrap();
        assert_eq!(out, Some("cba".to_string()));
    }

    #[tokio::test]
    async fn test_reverses_each_record_in_sequence() {
        let t = ReverseTransformer::new();
        let out = t
            .transform_many(
                "src",
                "topic",
                vec!["abc".to_string(), "de".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(out, Some(vec!["cba".to_string(), "ed".to_string()]));
    }

    #[tokio::test]
    async fn test_multibyte_records_survive() {
        let t = ReverseTransformer::new();
        let out = t
            .transform_one("src", "topic", "aé".to_string())
            .await
            .unwrap();
        assert_eq!(out, Some("éa".to_string()));
    }
}
