//! Source plug-in registry
//!
//! Maps implementation identifiers to plug-in factories, mirroring the
//! writer registry.

use std::collections::HashMap;

use crate::interval::IntervalPlugin;
use crate::source::SourcePlugin;

/// Factory for source plug-in instances
pub trait SourceFactory: Send + Sync {
    /// Create a fresh plug-in instance
    fn create(&self) -> Box<dyn SourcePlugin>;

    /// Implementation identifier for error messages
    fn name(&self) -> &'static str;
}

/// Registry of source factories keyed by implementation identifier
#[derive(Default)]
pub struct SourceRegistry {
    factories: HashMap<String, Box<dyn SourceFactory>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under an implementation identifier.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate identifier; registration happens once at
    /// program start.
    pub fn register<F: SourceFactory + 'static>(&mut self, id: &str, factory: F) {
        if self.factories.contains_key(id) {
            panic!("source factory '{id}' already registered");
        }
        self.factories.insert(id.to_string(), Box::new(factory));
    }

    /// Create a plug-in by implementation identifier
    pub fn create(&self, id: &str) -> Option<Box<dyn SourcePlugin>> {
        self.factories.get(id).map(|f| f.create())
    }

    /// Whether an identifier is registered
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered identifiers
    pub fn available(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

/// Factory for the interval source
pub struct IntervalFactory;

impl SourceFactory for IntervalFactory {
    fn create(&self) -> Box<dyn SourcePlugin> {
        Box::new(IntervalPlugin::new())
    }

    fn name(&self) -> &'static str {
        "interval"
    }
}

/// Create a registry with the built-in sources registered
pub fn default_registry() -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register("interval", IntervalFactory);
    registry
}
