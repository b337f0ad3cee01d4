//! The component catalog
//!
//! Holds the engine's live sources and writers by name and resolves route
//! targets for the router. The maps are populated during engine
//! initialization and frozen before anything runs, so reads while running
//! are uncontended.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use relay_routing::RouteTargets;
use relay_sources::Source;
use relay_transform::{Transformer, TransformerRegistry};
use relay_writers::Writer;

/// Name-indexed view of one deployment's components
pub struct Catalog {
    sources: RwLock<HashMap<String, Arc<Source>>>,
    writers: RwLock<HashMap<String, Arc<Writer>>>,
    /// Transformer logical name → implementation identifier
    transformer_types: HashMap<String, String>,
    transformers: Arc<TransformerRegistry>,
}

impl Catalog {
    /// Create a catalog with empty component maps
    pub fn new(
        transformer_types: HashMap<String, String>,
        transformers: Arc<TransformerRegistry>,
    ) -> Self {
        Self {
            sources: RwLock::new(HashMap::new()),
            writers: RwLock::new(HashMap::new()),
            transformer_types,
            transformers,
        }
    }

    /// Install the source map (engine initialization only)
    pub(crate) fn set_sources(&self, sources: HashMap<String, Arc<Source>>) {
        *self.sources.write() = sources;
    }

    /// Install the writer map (engine initialization only)
    pub(crate) fn set_writers(&self, writers: HashMap<String, Arc<Writer>>) {
        *self.writers.write() = writers;
    }

    /// Look up a source by instance name
    pub fn source(&self, name: &str) -> Option<Arc<Source>> {
        self.sources.read().get(name).cloned()
    }

    /// All sources, for lifecycle sweeps
    pub fn sources(&self) -> Vec<Arc<Source>> {
        self.sources.read().values().cloned().collect()
    }

    /// All writers, for lifecycle sweeps
    pub fn writers(&self) -> Vec<Arc<Writer>> {
        self.writers.read().values().cloned().collect()
    }
}

impl RouteTargets for Catalog {
    fn has_source(&self, name: &str) -> bool {
        self.sources.read().contains_key(name)
    }

    fn writer(&self, name: &str) -> Option<Arc<Writer>> {
        self.writers.read().get(name).cloned()
    }

    fn has_transformer_kind(&self, kind: &str) -> bool {
        self.transformer_types
            .get(kind)
            .is_some_and(|id| self.transformers.contains(id))
    }

    fn transformer(&self, kind: &str, info: &str) -> Option<Arc<dyn Transformer>> {
        let id = self.transformer_types.get(kind)?;
        match self.transformers.create(id, info) {
            Ok(transformer) => Some(transformer),
            Err(e) => {
                tracing::warn!(kind, id = %id, error = %e, "transformer construction failed");
                None
            }
        }
    }
}
