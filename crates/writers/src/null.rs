//! Null writer - counts and discards
//!
//! Receives records, bumps counters, and drops the data. Used to measure
//! pipeline throughput without sink I/O and as the observable endpoint in
//! integration tests: the counter handle stays valid after the plug-in is
//! consumed by its writer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use relay_protocol::PluginError;

use crate::plugin::{PluginOptions, WriterPlugin};

/// Counters shared between a [`NullPlugin`] and its observers
#[derive(Debug, Default)]
pub struct NullCounters {
    records: AtomicU64,
    batches: AtomicU64,
    bytes: AtomicU64,
}

impl NullCounters {
    /// Total individual records seen (batch members included)
    pub fn records(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    /// Total batch calls seen
    pub fn batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }

    /// Total payload bytes seen
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    fn record(&self, count: u64, bytes: u64) {
        self.records.fetch_add(count, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }
}

/// Writer plug-in that discards everything it receives
#[derive(Debug, Default)]
pub struct NullPlugin {
    counters: Arc<NullCounters>,
}

impl NullPlugin {
    /// Create a null plug-in
    pub fn new() -> Self {
        Self::default()
    }

    /// A counter handle that outlives the plug-in
    pub fn counters(&self) -> Arc<NullCounters> {
        Arc::clone(&self.counters)
    }
}

#[async_trait]
impl WriterPlugin for NullPlugin {
    async fn init(&mut self, _name: &str, _options: &PluginOptions) -> Result<(), PluginError> {
        Ok(())
    }

    async fn write_text(
        &mut self,
        _provider: &str,
        _topic: &str,
        record: String,
    ) -> Result<(), PluginError> {
        self.counters.record(1, record.len() as u64);
        Ok(())
    }

    async fn write_text_batch(
        &mut self,
        _provider: &str,
        _topic: &str,
        records: Vec<String>,
    ) -> Result<(), PluginError> {
        let bytes: usize = records.iter().map(String::len).sum();
        self.counters.batches.fetch_add(1, Ordering::Relaxed);
        self.counters.record(records.len() as u64, bytes as u64);
        Ok(())
    }

    async fn write_binary(
        &mut self,
        _provider: &str,
        _topic: &str,
        record: Bytes,
    ) -> Result<(), PluginError> {
        self.counters.record(1, record.len() as u64);
        Ok(())
    }

    async fn write_binary_batch(
        &mut self,
        _provider: &str,
        _topic: &str,
        records: Vec<Bytes>,
    ) -> Result<(), PluginError> {
        let bytes: usize = records.iter().map(Bytes::len).sum();
        self.counters.batches.fetch_add(1, Ordering::Relaxed);
        self.counters.record(records.len() as u64, bytes as u64);
        Ok(())
    }
}
