//! The writer plug-in seam
//!
//! A [`Writer`](crate::Writer) owns the lifecycle state machine and the
//! queues; the plug-in supplies the actual output behavior through these
//! hooks. Hooks run on the writer's consumer task, one at a time, and may
//! block on external I/O.

use async_trait::async_trait;
use bytes::Bytes;

use relay_protocol::PluginError;

/// Instance-specific options handed to a plug-in at initialization,
/// taken verbatim from the configuration file
pub type PluginOptions = serde_json::Map<String, serde_json::Value>;

/// The hooks a writer plug-in implements.
///
/// Returning `Err(PluginError::Fatal)` from any write hook transitions the
/// owning writer to `Failed`; the supervisor will restart it and queued
/// records survive the restart. Any other error loses the one record and the
/// runloop continues.
#[async_trait]
pub trait WriterPlugin: Send {
    /// Prepare the plug-in. Called once per successful `initialize` with the
    /// instance name and its configuration options.
    async fn init(&mut self, name: &str, options: &PluginOptions) -> Result<(), PluginError>;

    /// Emit a single text record
    async fn write_text(
        &mut self,
        provider: &str,
        topic: &str,
        record: String,
    ) -> Result<(), PluginError>;

    /// Emit an ordered sequence of text records
    async fn write_text_batch(
        &mut self,
        provider: &str,
        topic: &str,
        records: Vec<String>,
    ) -> Result<(), PluginError>;

    /// Emit a single binary record
    async fn write_binary(
        &mut self,
        provider: &str,
        topic: &str,
        record: Bytes,
    ) -> Result<(), PluginError>;

    /// Emit an ordered sequence of binary records
    async fn write_binary_batch(
        &mut self,
        provider: &str,
        topic: &str,
        records: Vec<Bytes>,
    ) -> Result<(), PluginError>;

    /// Graceful-stop hook, called after the consumer task has drained out.
    /// Flush and release external resources here.
    async fn stop(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}
