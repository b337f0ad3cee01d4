//! The ingest router
//!
//! The router is the one writer every source writes into. Records stage in
//! a work pool; `target_threads` scavenger workers drain it, resolve each
//! record against the current route table, and dispatch matches through
//! their transformer-writer binding. A dedicated refresher task keeps the
//! table reconciled with the route registry.
//!
//! # Table publication
//!
//! Refresh never mutates the live table. It deep-clones the current
//! instance, reconciles the clone against a fresh descriptor fetch, and
//! publishes it with one atomic pointer swap. Workers load the pointer per
//! record and can never observe a half-updated table. A failed fetch logs
//! and retains the previous table.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use bytes::Bytes;
use tokio::task::JoinHandle;

use relay_protocol::{RecordWriter, RunState, RunStateCell};
use relay_routing::{RouteTable, RouteTargets};
use relay_writers::WorkPool;

use crate::metrics::RouterMetrics;
use crate::registry::MetaRegistry;

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;

/// Re-fetch the route table when it is older than this
const REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

/// How often the refresher wakes to check table age
const REFRESH_POLL: Duration = Duration::from_secs(10);

/// How long an idle worker parks before re-polling
const IDLE_WAIT: Duration = Duration::from_millis(200);

/// How long stop waits for workers to observe the state change
const STOP_WAIT: Duration = Duration::from_secs(8);

/// The concurrent dispatch core
pub struct Router {
    state: RunStateCell,
    pool: Arc<WorkPool>,
    registry: Arc<dyn MetaRegistry>,
    targets: Arc<dyn RouteTargets>,
    table: ArcSwap<RouteTable>,
    target_threads: usize,
    last_refresh: parking_lot::Mutex<Option<Instant>>,
    tasks: parking_lot::Mutex<Vec<JoinHandle<()>>>,
    metrics: RouterMetrics,
}

impl Router {
    /// Create a router over a registry and a target resolver.
    /// `target_threads` of zero falls back to one worker.
    pub fn new(
        registry: Arc<dyn MetaRegistry>,
        targets: Arc<dyn RouteTargets>,
        target_threads: usize,
    ) -> Self {
        Self {
            state: RunStateCell::new(),
            pool: Arc::new(WorkPool::new()),
            registry,
            targets,
            table: ArcSwap::from_pointee(RouteTable::new()),
            target_threads: target_threads.max(1),
            last_refresh: parking_lot::Mutex::new(None),
            tasks: parking_lot::Mutex::new(Vec::new()),
            metrics: RouterMetrics::new(),
        }
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> RunState {
        self.state.get()
    }

    /// Dataplane counters
    #[inline]
    pub fn metrics(&self) -> &RouterMetrics {
        &self.metrics
    }

    /// Number of routes in the published table
    pub fn route_count(&self) -> usize {
        self.table.load().len()
    }

    /// Records staged but not yet dispatched
    pub fn pending(&self) -> usize {
        self.pool.len()
    }

    /// Initialize: prepare the registry and perform the first refresh.
    ///
    /// A registry fetch failure during the first refresh is tolerated - the
    /// router comes up with an empty table and the refresher recovers it -
    /// but a registry that cannot initialize at all fails initialization.
    /// Idempotent after success.
    pub async fn initialize(&self) -> bool {
        if !self
            .state
            .begin_transition(&[RunState::Created, RunState::FailedInitialization])
        {
            return self.state.initialized();
        }

        tracing::info!(workers = self.target_threads, "initializing router");

        if !self.registry.initialize().await {
            tracing::error!("route registry failed to initialize");
            self.state.complete(RunState::FailedInitialization);
            return false;
        }

        self.refresh().await;

        tracing::info!(routes = self.route_count(), "router initialized");
        self.state.complete(RunState::Initialized);
        true
    }

    /// Reconcile and publish a new route table.
    ///
    /// Clones the current table, applies a fresh descriptor fetch to the
    /// clone, and swaps it in. On a fetch error the previous table stays
    /// published. The refresh timestamp advances either way so a broken
    /// registry is retried on the poll cadence, not in a tight loop.
    pub async fn refresh(&self) {
        tracing::debug!("refreshing routes");
        let mut next = (**self.table.load()).clone();

        match self.registry.fetch().await {
            Ok(descriptors) => {
                next.update_routes(&descriptors, self.targets.as_ref());
                let routes = next.len();
                self.table.store(Arc::new(next));
                self.metrics.record_refresh();
                tracing::info!(descriptors = descriptors.len(), routes, "routes refreshed");
            }
            Err(e) => {
                self.metrics.record_refresh_failure();
                tracing::error!(error = %e, "route fetch failed, previous table retained");
            }
        }

        *self.last_refresh.lock() = Some(Instant::now());
    }

    /// Spawn the refresher and the scavenger workers.
    /// Legal from `Initialized`, `Stopped`, or `Failed`.
    pub fn start(self: &Arc<Self>) -> bool {
        if !self.state.begin_transition(&[
            RunState::Initialized,
            RunState::Stopped,
            RunState::Failed,
        ]) {
            return false;
        }

        tracing::info!(workers = self.target_threads, "starting router");

        // Reap anything left from a previous run before spawning anew
        for stale in self.tasks.lock().drain(..) {
            stale.abort();
        }

        self.state.complete(RunState::Running);

        let mut tasks = self.tasks.lock();
        let me = Arc::clone(self);
        tasks.push(tokio::spawn(async move { me.refresher().await }));
        for worker_id in 0..self.target_threads {
            let me = Arc::clone(self);
            tasks.push(tokio::spawn(async move { me.scavenge(worker_id).await }));
        }
        true
    }

    /// Stop the workers and the refresher. Records still staged when the
    /// workers exit stay in the pool; delivery is at-most-once.
    pub async fn stop(&self) -> bool {
        if !self.state.begin_transition(&[RunState::Running]) {
            return false;
        }

        tracing::info!("stopping router");
        self.pool.wake_all();

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        let deadline = Instant::now() + STOP_WAIT;
        for mut task in tasks {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if tokio::time::timeout(remaining, &mut task).await.is_err() {
                task.abort();
                let _ = task.await;
            }
        }

        self.state.complete(RunState::Stopped);
        tracing::info!(pending = self.pool.len(), "router stopped");
        true
    }

    /// The refresher loop: wake every poll interval, refresh when the table
    /// has aged past the refresh interval
    async fn refresher(self: Arc<Self>) {
        tracing::debug!("route refresher started");
        while self.state.is_running() {
            tokio::time::sleep(REFRESH_POLL).await;
            if !self.state.is_running() {
                break;
            }
            let due = self
                .last_refresh
                .lock()
                .map_or(true, |at| at.elapsed() > REFRESH_INTERVAL);
            if due {
                self.refresh().await;
            }
        }
        tracing::debug!("route refresher exiting");
    }

    /// A scavenger worker: drain the four queues, dispatch matches, park
    /// when idle
    async fn scavenge(self: Arc<Self>, worker_id: usize) {
        tracing::debug!(worker_id, "router worker started");
        while self.state.is_running() {
            let table = self.table.load_full();
            let mut drained = false;

            if let Some(t) = self.pool.poll_text() {
                drained = true;
                match table.lookup(&t.source, &t.topic) {
                    Some(binding) => {
                        let ok = binding.writer().write_text(&t.source, &t.topic, t.record).await;
                        self.record_dispatch(&t.source, &t.topic, ok);
                    }
                    None => self.drop_unrouteable(&t.source, &t.topic),
                }
            }

            if let Some(t) = self.pool.poll_binary() {
                drained = true;
                match table.lookup(&t.source, &t.topic) {
                    Some(binding) => {
                        let ok = binding
                            .writer()
                            .write_binary(&t.source, &t.topic, t.record)
                            .await;
                        self.record_dispatch(&t.source, &t.topic, ok);
                    }
                    None => self.drop_unrouteable(&t.source, &t.topic),
                }
            }

            if let Some(t) = self.pool.poll_text_batch() {
                drained = true;
                match table.lookup(&t.source, &t.topic) {
                    Some(binding) => {
                        let ok = binding
                            .writer()
                            .write_text_batch(&t.source, &t.topic, t.record)
                            .await;
                        self.record_dispatch(&t.source, &t.topic, ok);
                    }
                    None => self.drop_unrouteable(&t.source, &t.topic),
                }
            }

            if let Some(t) = self.pool.poll_binary_batch() {
                drained = true;
                match table.lookup(&t.source, &t.topic) {
                    Some(binding) => {
                        let ok = binding
                            .writer()
                            .write_binary_batch(&t.source, &t.topic, t.record)
                            .await;
                        self.record_dispatch(&t.source, &t.topic, ok);
                    }
                    None => self.drop_unrouteable(&t.source, &t.topic),
                }
            }

            if !drained {
                self.pool.idle_wait(IDLE_WAIT).await;
            }
        }
        tracing::debug!(worker_id, "router worker exiting");
    }

    /// A failed dispatch loses the record but never the worker
    fn record_dispatch(&self, source: &str, topic: &str, ok: bool) {
        if ok {
            self.metrics.record_routed();
        } else {
            self.metrics.record_dispatch_failure();
            tracing::warn!(source, topic, "dispatch rejected, record lost");
        }
    }

    fn drop_unrouteable(&self, source: &str, topic: &str) {
        self.metrics.record_unrouteable();
        tracing::trace!(source, topic, "no route, record dropped");
    }
}

impl RecordWriter for Router {
    fn write_text(&self, source: &str, topic: &str, record: String) -> bool {
        self.metrics.record_received();
        self.pool.write_text(source, topic, record)
    }

    fn write_text_batch(&self, source: &str, topic: &str, records: Vec<String>) -> bool {
        self.metrics.record_received();
        self.pool.write_text_batch(source, topic, records)
    }

    fn write_binary(&self, source: &str, topic: &str, record: Bytes) -> bool {
        self.metrics.record_received();
        self.pool.write_binary(source, topic, record)
    }

    fn write_binary_batch(&self, source: &str, topic: &str, records: Vec<Bytes>) -> bool {
        self.metrics.record_received();
        self.pool.write_binary_batch(source, topic, records)
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("state", &self.state.get())
            .field("routes", &self.route_count())
            .field("pending", &self.pool.len())
            .field("workers", &self.target_threads)
            .finish()
    }
}
