//! Writer plug-in registry
//!
//! Maps implementation identifiers to plug-in factories. The engine resolves
//! a configured instance's logical type through the `Types.DataWriters`
//! table to an identifier here and builds the plug-in from the factory.

use std::collections::HashMap;

use crate::adapter::TextAdapter;
use crate::null::NullPlugin;
use crate::plugin::WriterPlugin;
use crate::stdout::StdoutPlugin;

/// Factory for writer plug-in instances
pub trait WriterFactory: Send + Sync {
    /// Create a fresh plug-in instance
    fn create(&self) -> Box<dyn WriterPlugin>;

    /// Implementation identifier for error messages
    fn name(&self) -> &'static str;
}

/// Registry of writer factories keyed by implementation identifier
#[derive(Default)]
pub struct WriterRegistry {
    factories: HashMap<String, Box<dyn WriterFactory>>,
}

impl WriterRegistry {
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
    pub fn register<F: WriterFactory + 'static>(&mut self, id: &str, factory: F) {
        if self.factories.contains_key(id) {
            panic!("writer factory '{id}' already registered");
        }
        self.factories.insert(id.to_string(), Box::new(factory));
    }

    /// Create a plug-in by implementation identifier
    pub fn create(&self, id: &str) -> Option<Box<dyn WriterPlugin>> {
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

/// Factory for the stdout writer
pub struct StdoutFactory;

impl WriterFactory for StdoutFactory {
    fn create(&self) -> Box<dyn WriterPlugin> {
        Box::new(TextAdapter::new(StdoutPlugin::new()))
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Factory for the null writer
pub struct NullFactory;

impl WriterFactory for NullFactory {
    fn create(&self) -> Box<dyn WriterPlugin> {
        Box::new(NullPlugin::new())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

/// Create a registry with the built-in writers registered
pub fn default_registry() -> WriterRegistry {
    let mut registry = WriterRegistry::new();
    registry.register("stdout", StdoutFactory);
    registry.register("null", NullFactory);
    registry
}
