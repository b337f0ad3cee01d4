//! The writer runloop
//!
//! `Writer` composes the lifecycle state machine, a private [`WorkPool`],
//! and an injected [`WriterPlugin`]. The four public `write_*` entry points
//! enqueue and return immediately; a single consumer task drains the queues
//! round-robin and drives the plug-in hooks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::task::JoinHandle;

use relay_protocol::{PluginError, RecordWriter, RunState, RunStateCell};

use crate::plugin::{PluginOptions, WriterPlugin};
use crate::pool::WorkPool;

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;

/// How long the consumer parks when all queues are empty
const IDLE_WAIT: Duration = Duration::from_millis(200);

/// One cooperative-shutdown poll; stop waits for three of these
const STOP_POLL: Duration = Duration::from_secs(15);
const STOP_POLLS: u32 = 3;

/// Bound on the plug-in stop hook and on reaping an aborted consumer
const STOP_GRACE: Duration = Duration::from_secs(60);

/// A named destination writer: async enqueue plus a dedicated consumer task
pub struct Writer {
    name: parking_lot::Mutex<String>,
    state: RunStateCell,
    pool: Arc<WorkPool>,
    plugin: Arc<tokio::sync::Mutex<Box<dyn WriterPlugin>>>,
    options: PluginOptions,
    consumer: parking_lot::Mutex<Option<JoinHandle<()>>>,
    errors: AtomicU64,
}

impl Writer {
    /// Create a writer around a plug-in and its instance options.
    /// The writer is `Created` until [`initialize`](Self::initialize) runs.
    pub fn new(plugin: Box<dyn WriterPlugin>, options: PluginOptions) -> Self {
        Self {
            name: parking_lot::Mutex::new(String::new()),
            state: RunStateCell::new(),
            pool: Arc::new(WorkPool::new()),
            plugin: Arc::new(tokio::sync::Mutex::new(plugin)),
            options,
            consumer: parking_lot::Mutex::new(None),
            errors: AtomicU64::new(0),
        }
    }

    /// The instance name assigned at initialization
    pub fn name(&self) -> String {
        self.name.lock().clone()
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> RunState {
        self.state.get()
    }

    /// Records queued but not yet handed to the plug-in
    pub fn pending(&self) -> usize {
        self.pool.len()
    }

    /// Hook errors swallowed by the runloop (fatal and non-fatal)
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Initialize the plug-in under the given instance name.
    ///
    /// Idempotent after success; returns `false` when the plug-in rejects
    /// its options (state becomes `FailedInitialization`, retry allowed).
    pub async fn initialize(&self, name: &str) -> bool {
        if !self
            .state
            .begin_transition(&[RunState::Created, RunState::FailedInitialization])
        {
            return self.state.initialized();
        }

        *self.name.lock() = name.to_string();
        tracing::info!(writer = name, "initializing writer");

        match self.plugin.lock().await.init(name, &self.options).await {
            Ok(()) => {
                self.state.complete(RunState::Initialized);
                true
            }
            Err(e) => {
                tracing::error!(writer = name, error = %e, "writer initialization failed");
                self.state.complete(RunState::FailedInitialization);
                false
            }
        }
    }

    /// Launch the consumer task. Legal from `Initialized`, `Stopped`, or
    /// `Failed` (the supervisor restarts failed writers through here).
    pub fn start(self: &Arc<Self>) -> bool {
        if !self.state.begin_transition(&[
            RunState::Initialized,
            RunState::Stopped,
            RunState::Failed,
        ]) {
            return false;
        }

        tracing::info!(writer = %self.name(), "starting writer");

        // A restart may find the previous consumer still wound down; make
        // sure it is gone before the new one takes the queues.
        if let Some(stale) = self.consumer.lock().take() {
            stale.abort();
        }

        self.state.complete(RunState::Running);

        let me = Arc::clone(self);
        let handle = tokio::spawn(async move { me.consume().await });
        *self.consumer.lock() = Some(handle);
        true
    }

    /// Stop the consumer: signal, wait for the cooperative exit, run the
    /// plug-in stop hook, then force-cancel anything still running.
    pub async fn stop(&self) -> bool {
        if !self.state.begin_transition(&[RunState::Running]) {
            return false;
        }

        let name = self.name();
        tracing::info!(writer = %name, "stopping writer");
        self.pool.wake_all();

        let handle = self.consumer.lock().take();
        let mut exited = false;
        if let Some(mut handle) = handle {
            for _ in 0..STOP_POLLS {
                if tokio::time::timeout(STOP_POLL, &mut handle).await.is_ok() {
                    exited = true;
                    break;
                }
                tracing::warn!(writer = %name, "consumer has not exited yet");
            }

            let clean = self.run_stop_hook(&name).await;

            if !exited {
                handle.abort();
                let _ = tokio::time::timeout(STOP_GRACE, handle).await;
            }

            if clean {
                self.state.complete(RunState::Stopped);
                tracing::info!(writer = %name, "writer stopped");
                return true;
            }
        } else {
            // Never started a consumer or it was reaped already
            if self.run_stop_hook(&name).await {
                self.state.complete(RunState::Stopped);
                return true;
            }
        }

        tracing::error!(writer = %name, "writer failed to stop cleanly");
        self.state.complete(RunState::Failed);
        false
    }

    /// Run the plug-in stop hook with a bound, in case the consumer left the
    /// plug-in wedged on external I/O
    async fn run_stop_hook(&self, name: &str) -> bool {
        let hook = async {
            self.plugin.lock().await.stop().await
        };
        match tokio::time::timeout(STOP_GRACE, hook).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!(writer = name, error = %e, "plugin stop hook failed");
                false
            }
            Err(_) => {
                tracing::error!(writer = name, "plugin stop hook timed out");
                false
            }
        }
    }

    /// The consumer loop: drain the four queues round-robin, park when idle,
    /// exit as soon as the state leaves `Running`.
    async fn consume(self: Arc<Self>) {
        let name = self.name();
        tracing::debug!(writer = %name, "writer consumer started");

        while self.state.is_running() {
            let mut drained = false;

            if let Some(t) = self.pool.poll_text() {
                drained = true;
                let r = {
                    let mut plugin = self.plugin.lock().await;
                    plugin.write_text(&t.source, &t.topic, t.record).await
                };
                self.handle_hook_result(&name, r);
            }

            if let Some(t) = self.pool.poll_binary() {
                drained = true;
                let r = {
                    let mut plugin = self.plugin.lock().await;
                    plugin.write_binary(&t.source, &t.topic, t.record).await
                };
                self.handle_hook_result(&name, r);
            }

            if let Some(t) = self.pool.poll_text_batch() {
                drained = true;
                let r = {
                    let mut plugin = self.plugin.lock().await;
                    plugin.write_text_batch(&t.source, &t.topic, t.record).await
                };
                self.handle_hook_result(&name, r);
            }

            if let Some(t) = self.pool.poll_binary_batch() {
                drained = true;
                let r = {
                    let mut plugin = self.plugin.lock().await;
                    plugin
                        .write_binary_batch(&t.source, &t.topic, t.record)
                        .await
                };
                self.handle_hook_result(&name, r);
            }

            if !drained {
                self.pool.idle_wait(IDLE_WAIT).await;
            }
        }

        tracing::debug!(writer = %name, "writer consumer exiting");
    }

    /// A fatal hook error fails the writer; everything else loses one record
    fn handle_hook_result(&self, name: &str, result: Result<(), PluginError>) {
        match result {
            Ok(()) => {}
            Err(e) if e.is_fatal() => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                tracing::error!(writer = name, error = %e, "writer failed");
                self.state.set_failed();
            }
            Err(e) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(writer = name, error = %e, "record lost");
            }
        }
    }
}

impl RecordWriter for Writer {
    fn write_text(&self, source: &str, topic: &str, record: String) -> bool {
        self.pool.write_text(source, topic, record)
    }

    fn write_text_batch(&self, source: &str, topic: &str, records: Vec<String>) -> bool {
        self.pool.write_text_batch(source, topic, records)
    }

    fn write_binary(&self, source: &str, topic: &str, record: Bytes) -> bool {
        self.pool.write_binary(source, topic, record)
    }

    fn write_binary_batch(&self, source: &str, topic: &str, records: Vec<Bytes>) -> bool {
        self.pool.write_binary_batch(source, topic, records)
    }
}
