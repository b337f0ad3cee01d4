//! The fan-in seam records are written into

use bytes::Bytes;

/// Anything a source can write records into.
///
/// The router, every writer, and the work pools all accept the same four
/// payload shapes, so sources only ever hold an `Arc<dyn RecordWriter>` and
/// never know whether they are feeding the router directly or a test double.
///
/// All four methods enqueue and return immediately; `true` means the record
/// was accepted, not that it was delivered. Delivery is at-most-once by
/// design.
pub trait RecordWriter: Send + Sync {
    /// Write a single text record
    fn write_text(&self, source: &str, topic: &str, record: String) -> bool;

    /// Write an ordered sequence of text records
    fn write_text_batch(&self, source: &str, topic: &str, records: Vec<String>) -> bool;

    /// Write a single binary record
    fn write_binary(&self, source: &str, topic: &str, record: Bytes) -> bool;

    /// Write an ordered sequence of binary records
    fn write_binary_batch(&self, source: &str, topic: &str, records: Vec<Bytes>) -> bool;
}
