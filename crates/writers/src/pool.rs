//! The work pool - concurrent staging queues for pending records
//!
//! Four independent multi-producer/multi-consumer FIFO queues, one per
//! payload shape. Producers enqueue and return immediately; consumers poll
//! non-blockingly across all four and park on [`WorkPool::idle_wait`] when
//! everything is empty.
//!
//! There is no bound and no backpressure: if producers outrun consumers,
//! memory grows. Sources are expected to self-limit.

use std::time::Duration;

use bytes::Bytes;
use crossbeam_queue::SegQueue;
use tokio::sync::Notify;

use relay_protocol::{MessageTuple, RecordWriter};

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;

/// Concurrent staging area for the four record shapes
#[derive(Debug, Default)]
pub struct WorkPool {
    text: SegQueue<MessageTuple<String>>,
    text_batches: SegQueue<MessageTuple<Vec<String>>>,
    binary: SegQueue<MessageTuple<Bytes>>,
    binary_batches: SegQueue<MessageTuple<Vec<Bytes>>>,
    wake: Notify,
}

impl WorkPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Dequeue one text record, non-blocking
    #[inline]
    pub fn poll_text(&self) -> Option<MessageTuple<String>> {
        self.text.pop()
    }

    /// Dequeue one text sequence, non-blocking
    #[inline]
    pub fn poll_text_batch(&self) -> Option<MessageTuple<Vec<String>>> {
        self.text_batches.pop()
    }

    /// Dequeue one binary record, non-blocking
    #[inline]
    pub fn poll_binary(&self) -> Option<MessageTuple<Bytes>> {
        self.binary.pop()
    }

    /// Dequeue one binary sequence, non-blocking
    #[inline]
    pub fn poll_binary_batch(&self) -> Option<MessageTuple<Vec<Bytes>>> {
        self.binary_batches.pop()
    }

    /// Park until a record is enqueued or `timeout` elapses.
    ///
    /// The wake is advisory: a consumer must re-poll after waking. The
    /// bounded timeout covers the window where a producer enqueues between a
    /// consumer's last poll and its park.
    pub async fn idle_wait(&self, timeout: Duration) {
        let _ = tokio::time::timeout(timeout, self.wake.notified()).await;
    }

    /// Wake every parked consumer (used on shutdown)
    pub fn wake_all(&self) {
        self.wake.notify_waiters();
    }

    /// Total records pending across all four queues
    pub fn len(&self) -> usize {
        self.text.len() + self.text_batches.len() + self.binary.len() + self.binary_batches.len()
    }

    /// Whether all four queues are empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
            && self.text_batches.is_empty()
            && self.binary.is_empty()
            && self.binary_batches.is_empty()
    }
}

impl RecordWriter for WorkPool {
    fn write_text(&self, source: &str, topic: &str, record: String) -> bool {
        self.text.push(MessageTuple::new(source, topic, record));
        self.wake.notify_one();
        true
    }

    fn write_text_batch(&self, source: &str, topic: &str, records: Vec<String>) -> bool {
        self.text_batches.push(MessageTuple::new(source, topic, records));
        self.wake.notify_one();
        true
    }

    fn write_binary(&self, source: &str, topic: &str, record: Bytes) -> bool {
        self.binary.push(MessageTuple::new(source, topic, record));
        self.wake.notify_one();
        true
    }

    fn write_binary_batch(&self, source: &str, topic: &str, records: Vec<Bytes>) -> bool {
        self.binary_batches.push(MessageTuple::new(source, topic, records));
        self.wake.notify_one();
        true
    }
}
