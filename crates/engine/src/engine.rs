//! The engine supervisor

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use relay_config::{Config, RegistryKind};
use relay_pipeline::{HttpRegistry, MetaRegistry, Router, StaticRegistry};
use relay_protocol::{RecordWriter, RunState, RunStateCell};
use relay_routing::{RouteDescriptor, RouteTargets};
use relay_sources::Source;
use relay_writers::Writer;

use crate::catalog::Catalog;
use crate::PluginRegistries;

/// Pause between monitor passes; bounded so the sweep never busy-loops
const MONITOR_PAUSE: Duration = Duration::from_millis(250);

/// Supervisor for one ingest deployment
pub struct Engine {
    config: Config,
    registries: PluginRegistries,
    catalog: Arc<Catalog>,
    router: Arc<Router>,
    state: Arc<RunStateCell>,
    monitor: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Compose an engine from configuration and plug-in registries. Nothing
    /// is resolved or started until [`initialize`](Self::initialize).
    pub fn new(config: Config, registries: PluginRegistries) -> Self {
        // The transformer registry moves into the catalog (route resolution
        // needs it); the source/writer registries stay on the engine for
        // instance construction.
        let mut registries = registries;
        let transformers = Arc::new(std::mem::take(&mut registries.transformers));

        let catalog = Arc::new(Catalog::new(
            config.types.transformers.clone(),
            transformers,
        ));

        let meta: Arc<dyn MetaRegistry> = match config.registry.kind {
            RegistryKind::Http => Arc::new(HttpRegistry::new(
                config.registry.url.clone().unwrap_or_default(),
                config.deploy_name.clone(),
            )),
            RegistryKind::Static => Arc::new(StaticRegistry::new(
                config
                    .registry
                    .routes
                    .iter()
                    .map(|r| {
                        RouteDescriptor::new(
                            r.source.clone(),
                            r.source_topic.clone(),
                            r.dest_name.clone(),
                            r.dest_topic.clone(),
                            r.batch_size,
                            Some(r.xform_name.clone()),
                        )
                    })
                    .collect(),
            )),
        };

        let router = Arc::new(Router::new(
            meta,
            Arc::clone(&catalog) as Arc<dyn relay_routing::RouteTargets>,
            config.target_threads(),
        ));

        Self {
            config,
            registries,
            catalog,
            router,
            state: Arc::new(RunStateCell::new()),
            monitor: parking_lot::Mutex::new(None),
        }
    }

    /// The deployment name from configuration
    pub fn deployment_name(&self) -> &str {
        &self.config.deploy_name
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> RunState {
        self.state.get()
    }

    /// The router (stable for the life of the engine)
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Look up a source by instance name
    pub fn source(&self, name: &str) -> Option<Arc<Source>> {
        self.catalog.source(name)
    }

    /// Look up a writer by instance name
    pub fn writer(&self, name: &str) -> Option<Arc<Writer>> {
        self.catalog.writer(name)
    }

    /// Initialize sources, then writers, then the router.
    ///
    /// An instance whose plug-in cannot be built or refuses to initialize is
    /// omitted with an error log; routes naming it will not resolve. A
    /// router that cannot initialize fails the engine. Idempotent after
    /// success.
    pub async fn initialize(&self) -> bool {
        if !self.state.begin_transition(&[
            RunState::Created,
            RunState::FailedInitialization,
        ]) {
            return self.state.initialized();
        }

        tracing::info!(deployment = %self.config.deploy_name, "initializing engine");

        let mut sources: HashMap<String, Arc<Source>> = HashMap::new();
        for (name, instance) in &self.config.sources {
            let Some(impl_id) = self.config.types.data_sources.get(&instance.kind) else {
                tracing::error!(source = %name, kind = %instance.kind, "undeclared source type");
                continue;
            };
            let Some(plugin) = self.registries.sources.create(impl_id) else {
                tracing::error!(
                    source = %name,
                    impl_id = %impl_id,
                    "no source factory registered"
                );
                continue;
            };
            let source = Arc::new(Source::new(
                plugin,
                instance.options.clone(),
                Arc::clone(&self.router) as Arc<dyn RecordWriter>,
            ));
            if source.initialize(name).await {
                sources.insert(name.clone(), source);
            } else {
                tracing::error!(source = %name, "source omitted: initialization failed");
            }
        }
        self.catalog.set_sources(sources);

        let mut writers: HashMap<String, Arc<Writer>> = HashMap::new();
        for (name, instance) in &self.config.writers {
            let Some(impl_id) = self.config.types.data_writers.get(&instance.kind) else {
                tracing::error!(writer = %name, kind = %instance.kind, "undeclared writer type");
                continue;
            };
            let Some(plugin) = self.registries.writers.create(impl_id) else {
                tracing::error!(
                    writer = %name,
                    impl_id = %impl_id,
                    "no writer factory registered"
                );
                continue;
            };
            let writer = Arc::new(Writer::new(plugin, instance.options.clone()));
            if writer.initialize(name).await {
                writers.insert(name.clone(), writer);
            } else {
                tracing::error!(writer = %name, "writer omitted: initialization failed");
            }
        }
        self.catalog.set_writers(writers);

        if !self.router.initialize().await {
            tracing::error!("engine initialization failed: router did not initialize");
            self.state.complete(RunState::FailedInitialization);
            return false;
        }

        tracing::info!(
            sources = self.catalog.sources().len(),
            writers = self.catalog.writers().len(),
            routes = self.router.route_count(),
            "engine initialized"
        );
        self.state.complete(RunState::Initialized);
        true
    }

    /// Start writers, then the router, then sources, then the monitor.
    /// Any component that refuses to start fails the engine.
    pub async fn start(&self) -> bool {
        if !self.state.begin_transition(&[
            RunState::Initialized,
            RunState::Stopped,
            RunState::Failed,
        ]) {
            return false;
        }

        tracing::info!(deployment = %self.config.deploy_name, "starting engine");

        let mut failed = false;
        for writer in self.catalog.writers() {
            if !writer.start() {
                tracing::error!(writer = %writer.name(), "writer failed to start");
                failed = true;
            }
        }

        if !self.router.start() {
            tracing::error!("router failed to start");
            failed = true;
        }

        for source in self.catalog.sources() {
            if !source.start() {
                tracing::error!(source = %source.name(), "source failed to start");
                failed = true;
            }
        }

        if failed {
            tracing::error!("engine start failed");
            self.state.complete(RunState::Failed);
            return false;
        }

        // The monitor gates on the Running state, so publish it first
        self.state.complete(RunState::Running);

        let catalog = Arc::clone(&self.catalog);
        let router = Arc::clone(&self.router);
        let state = Arc::clone(&self.state);
        *self.monitor.lock() = Some(tokio::spawn(async move {
            monitor(catalog, router, state).await;
        }));

        tracing::info!("engine started");
        true
    }

    /// Stop the monitor, then sources, then the router, then writers.
    /// Returns `false` (state `Failed`) if any component refused to stop.
    pub async fn stop(&self) -> bool {
        if !self
            .state
            .begin_transition(&[RunState::Running, RunState::Failed])
        {
            return false;
        }

        tracing::info!(deployment = %self.config.deploy_name, "stopping engine");

        if let Some(monitor) = self.monitor.lock().take() {
            monitor.abort();
        }

        let mut failed = false;
        for source in self.catalog.sources() {
            if !source.stop().await {
                tracing::error!(source = %source.name(), "source failed to stop");
                failed = true;
            }
        }

        if !self.router.stop().await {
            tracing::error!("router failed to stop");
            failed = true;
        }

        for writer in self.catalog.writers() {
            if !writer.stop().await {
                tracing::error!(writer = %writer.name(), "writer failed to stop");
                failed = true;
            }
        }

        if failed {
            tracing::error!("engine stop failed");
            self.state.complete(RunState::Failed);
            false
        } else {
            tracing::info!("engine stopped");
            self.state.complete(RunState::Stopped);
            true
        }
    }
}

/// Restart any component observed `Failed` while the engine runs.
/// Each pass ends with a bounded pause so the sweep never spins.
async fn monitor(catalog: Arc<Catalog>, router: Arc<Router>, state: Arc<RunStateCell>) {
    tracing::debug!("engine monitor started");
    while state.is_running() {
        for writer in catalog.writers() {
            if writer.state() == RunState::Failed {
                tracing::warn!(writer = %writer.name(), "restarting failed writer");
                writer.start();
            }
        }

        if router.state() == RunState::Failed {
            tracing::warn!("restarting failed router");
            router.start();
        }

        for source in catalog.sources() {
            if source.state() == RunState::Failed {
                tracing::warn!(source = %source.name(), "restarting failed source");
                source.start();
            }
        }

        tokio::time::sleep(MONITOR_PAUSE).await;
    }
    tracing::debug!("engine monitor exiting");
}
