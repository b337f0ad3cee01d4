//! The source runloop

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use relay_protocol::{PluginError, RecordWriter, RunState, RunStateCell};

use crate::PluginOptions;

#[cfg(test)]
#[path = "source_test.rs"]
mod source_test;

/// One cooperative-shutdown poll; stop waits for three of these
const STOP_POLL: Duration = Duration::from_secs(15);
const STOP_POLLS: u32 = 3;

/// Bound on the plug-in stop hook and on reaping an aborted producer
const STOP_GRACE: Duration = Duration::from_secs(60);

/// What a source plug-in sees of its host
pub struct SourceContext {
    name: String,
    state: Arc<RunStateCell>,
    output: Arc<dyn RecordWriter>,
}

impl SourceContext {
    /// The instance name, used as the `source` of every produced record
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True while the source should keep producing. Plug-ins must poll this
    /// and return from `run` promptly once it goes false.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Write a single text record into the pipeline
    pub fn write_text(&self, topic: &str, record: String) -> bool {
        self.output.write_text(&self.name, topic, record)
    }

    /// Write an ordered sequence of text records
    pub fn write_text_batch(&self, topic: &str, records: Vec<String>) -> bool {
        self.output.write_text_batch(&self.name, topic, records)
    }

    /// Write a single binary record
    pub fn write_binary(&self, topic: &str, record: bytes::Bytes) -> bool {
        self.output.write_binary(&self.name, topic, record)
    }

    /// Write an ordered sequence of binary records
    pub fn write_binary_batch(&self, topic: &str, records: Vec<bytes::Bytes>) -> bool {
        self.output.write_binary_batch(&self.name, topic, records)
    }
}

/// The hooks a source plug-in implements.
///
/// `run` is the producer: it blocks on external input and writes records
/// through the context until `ctx.is_running()` goes false. Returning `Err`
/// transitions the source to `Failed`; the supervisor will restart it by
/// calling `run` again.
#[async_trait]
pub trait SourcePlugin: Send {
    /// Prepare the plug-in with the instance name and its options
    async fn init(&mut self, name: &str, options: &PluginOptions) -> Result<(), PluginError>;

    /// Produce records until the context reports not-running
    async fn run(&mut self, ctx: SourceContext) -> Result<(), PluginError>;

    /// Graceful-stop hook, called after the producer task has wound down
    async fn stop(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// A named ingest source: lifecycle state machine plus one producer task
pub struct Source {
    name: parking_lot::Mutex<String>,
    state: Arc<RunStateCell>,
    plugin: Arc<tokio::sync::Mutex<Box<dyn SourcePlugin>>>,
    options: PluginOptions,
    output: Arc<dyn RecordWriter>,
    producer: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl Source {
    /// Create a source around a plug-in, its options, and the record sink it
    /// produces into (the router in production)
    pub fn new(
        plugin: Box<dyn SourcePlugin>,
        options: PluginOptions,
        output: Arc<dyn RecordWriter>,
    ) -> Self {
        Self {
            name: parking_lot::Mutex::new(String::new()),
            state: Arc::new(RunStateCell::new()),
            plugin: Arc::new(tokio::sync::Mutex::new(plugin)),
            options,
            output,
            producer: parking_lot::Mutex::new(None),
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

    /// Initialize the plug-in under the given instance name.
    /// Idempotent after success.
    pub async fn initialize(&self, name: &str) -> bool {
        if !self
            .state
            .begin_transition(&[RunState::Created, RunState::FailedInitialization])
        {
            return self.state.initialized();
        }

        *self.name.lock() = name.to_string();
        tracing::info!(source = name, "initializing source");

        match self.plugin.lock().await.init(name, &self.options).await {
            Ok(()) => {
                self.state.complete(RunState::Initialized);
                true
            }
            Err(e) => {
                tracing::error!(source = name, error = %e, "source initialization failed");
                self.state.complete(RunState::FailedInitialization);
                false
            }
        }
    }

    /// Launch the producer task
    pub fn start(self: &Arc<Self>) -> bool {
        if !self.state.begin_transition(&[
            RunState::Initialized,
            RunState::Stopped,
            RunState::Failed,
        ]) {
            return false;
        }

        tracing::info!(source = %self.name(), "starting source");

        if let Some(stale) = self.producer.lock().take() {
            stale.abort();
        }

        self.state.complete(RunState::Running);

        let me = Arc::clone(self);
        let handle = tokio::spawn(async move { me.produce().await });
        *self.producer.lock() = Some(handle);
        true
    }

    /// Stop the producer: signal via state, wait for the cooperative exit,
    /// run the plug-in stop hook, then force-cancel if needed
    pub async fn stop(&self) -> bool {
        if !self.state.begin_transition(&[RunState::Running]) {
            return false;
        }

        let name = self.name();
        tracing::info!(source = %name, "stopping source");

        let handle = self.producer.lock().take();
        let mut exited = false;
        if let Some(mut handle) = handle {
            for _ in 0..STOP_POLLS {
                if tokio::time::timeout(STOP_POLL, &mut handle).await.is_ok() {
                    exited = true;
                    break;
                }
                tracing::warn!(source = %name, "producer has not exited yet");
            }

            let clean = self.run_stop_hook(&name).await;

            if !exited {
                handle.abort();
                let _ = tokio::time::timeout(STOP_GRACE, handle).await;
            }

            if clean {
                self.state.complete(RunState::Stopped);
                tracing::info!(source = %name, "source stopped");
                return true;
            }
        } else if self.run_stop_hook(&name).await {
            self.state.complete(RunState::Stopped);
            return true;
        }

        tracing::error!(source = %name, "source failed to stop cleanly");
        self.state.complete(RunState::Failed);
        false
    }

    async fn run_stop_hook(&self, name: &str) -> bool {
        let hook = async { self.plugin.lock().await.stop().await };
        match tokio::time::timeout(STOP_GRACE, hook).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!(source = name, error = %e, "plugin stop hook failed");
                false
            }
            Err(_) => {
                tracing::error!(source = name, "plugin stop hook timed out");
                false
            }
        }
    }

    /// Drive the plug-in producer once; an error while still running fails
    /// the source for the supervisor to restart
    async fn produce(self: Arc<Self>) {
        let name = self.name();
        let ctx = SourceContext {
            name: name.clone(),
            state: Arc::clone(&self.state),
            output: Arc::clone(&self.output),
        };

        tracing::debug!(source = %name, "source producer started");
        let result = self.plugin.lock().await.run(ctx).await;
        match result {
            Ok(()) => tracing::debug!(source = %name, "source producer finished"),
            Err(e) => {
                tracing::error!(source = %name, error = %e, "source producer failed");
                if self.state.is_running() {
                    self.state.set_failed();
                }
            }
        }
    }
}
