//! Transformer registry - config-driven transformer creation
//!
//! The registry maps implementation identifiers to factory functions. This is
//! the explicit factory map that stands in for loading plug-ins by class
//! name: the configuration's `Transformers` table resolves a logical name to
//! an identifier here, and the route table asks the registry for a fresh
//! instance per route.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{NoopTransformer, ReverseTransformer, TransformResult, TransformError, Transformer};

#[cfg(test)]
#[path = "registry_test.rs"]
mod registry_test;

/// Factory trait for creating transformers
///
/// `info` is everything after the first `:` in the route's transform
/// selector; factories interpret it however they need (a function name, an
/// inline option string, nothing at all).
pub trait TransformerFactory: Send + Sync {
    /// Create a transformer instance for one route
    fn create(&self, info: &str) -> TransformResult<Arc<dyn Transformer>>;

    /// Implementation identifier for error messages
    fn name(&self) -> &'static str;
}

/// Registry of transformer factories keyed by implementation identifier
pub struct TransformerRegistry {
    factories: HashMap<String, Box<dyn TransformerFactory>>,
}

impl TransformerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory under an implementation identifier.
    ///
    /// # Panics
    ///
    /// Panics if the identifier is already registered; registration happens
    /// once at program start, where a duplicate is a programming error.
    pub fn register<F: TransformerFactory + 'static>(&mut self, id: &str, factory: F) {
        if self.factories.contains_key(id) {
            panic!("transformer factory '{id}' already registered");
        }
        self.factories.insert(id.to_string(), Box::new(factory));
    }

    /// Create a transformer by implementation identifier
    pub fn create(&self, id: &str, info: &str) -> TransformResult<Arc<dyn Transformer>> {
        let factory = self.factories.get(id).ok_or_else(|| {
            TransformError::config(format!(
                "unknown transformer '{id}', available: [{}]",
                self.available().join(", ")
            ))
        })?;
        factory.create(info)
    }

    /// Whether an implementation identifier is registered
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered implementation identifiers
    pub fn available(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    /// Number of registered factories
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory for [`NoopTransformer`]
pub struct NoopFactory;

impl TransformerFactory for NoopFactory {
    fn create(&self, _info: &str) -> TransformResult<Arc<dyn Transformer>> {
        Ok(Arc::new(NoopTransformer::new()))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Factory for [`ReverseTransformer`]
pub struct ReverseFactory;

impl TransformerFactory for ReverseFactory {
    fn create(&self, _info: &str) -> TransformResult<Arc<dyn Transformer>> {
        Ok(Arc::new(ReverseTransformer::new()))
    }

    fn name(&self) -> &'static str {
        "reverse"
    }
}
