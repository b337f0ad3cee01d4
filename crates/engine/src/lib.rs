//! Relay - Engine
//!
//! The composition root and supervisor for one ingest deployment. An
//! [`Engine`] is built from a [`Config`](relay_config::Config) and a set of
//! [`PluginRegistries`]; it owns every source, every writer, and the router,
//! drives their lifecycles in the prescribed order, and restarts anything
//! that fails while running.
//!
//! There are no process-global singletons: construct an engine, hand its
//! reference down, and tests can run as many independent engines as they
//! like.
//!
//! # Lifecycle
//!
//! - **initialize**: resolve and initialize sources, then writers, freeze
//!   the component catalog, then initialize the router (which performs the
//!   first route refresh against the catalog).
//! - **start**: writers → router → sources, then launch the monitor.
//! - **monitor**: scans writers, the router, and sources on a bounded
//!   cadence and re-`start()`s anything observed `Failed`.
//! - **stop**: monitor → sources → router → writers.

mod catalog;
mod engine;

pub use catalog::Catalog;
pub use engine::Engine;

use relay_sources::SourceRegistry;
use relay_transform::TransformerRegistry;
use relay_writers::WriterRegistry;

/// The three plug-in factory registries an engine resolves types against
pub struct PluginRegistries {
    /// Source kinds by implementation identifier
    pub sources: SourceRegistry,
    /// Writer kinds by implementation identifier
    pub writers: WriterRegistry,
    /// Transformer kinds by implementation identifier
    pub transformers: TransformerRegistry,
}

impl PluginRegistries {
    /// Registries pre-loaded with every built-in plug-in:
    /// `interval` source, `stdout`/`null` writers, `noop`/`reverse`
    /// transformers
    pub fn builtin() -> Self {
        Self {
            sources: relay_sources::registry::default_registry(),
            writers: relay_writers::registry::default_registry(),
            transformers: relay_transform::default_registry(),
        }
    }

    /// Empty registries, for embedders that register everything themselves
    pub fn empty() -> Self {
        Self {
            sources: SourceRegistry::new(),
            writers: WriterRegistry::new(),
            transformers: TransformerRegistry::new(),
        }
    }
}
