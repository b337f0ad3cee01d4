//! Codec adapters between payload families
//!
//! Most outputs natively speak one payload family. A plug-in implements the
//! narrow trait for its family ([`TextPlugin`] or [`BinaryPlugin`]) and the
//! matching adapter supplies the other family's hooks by converting at the
//! boundary: binary records become base64 text, text records become their
//! UTF-8 bytes.

use async_trait::async_trait;
use bytes::Bytes;

use relay_protocol::{codec, PluginError};

use crate::plugin::{PluginOptions, WriterPlugin};

#[cfg(test)]
#[path = "adapter_test.rs"]
mod adapter_test;

/// A plug-in that only knows how to emit text
#[async_trait]
pub trait TextPlugin: Send {
    /// Prepare the plug-in
    async fn init(&mut self, name: &str, options: &PluginOptions) -> Result<(), PluginError>;

    /// Emit a single text record
    async fn write(
        &mut self,
        provider: &str,
        topic: &str,
        record: String,
    ) -> Result<(), PluginError>;

    /// Emit an ordered sequence of text records
    async fn write_batch(
        &mut self,
        provider: &str,
        topic: &str,
        records: Vec<String>,
    ) -> Result<(), PluginError>;

    /// Graceful-stop hook
    async fn stop(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// A plug-in that only knows how to emit bytes
#[async_trait]
pub trait BinaryPlugin: Send {
    /// Prepare the plug-in
    async fn init(&mut self, name: &str, options: &PluginOptions) -> Result<(), PluginError>;

    /// Emit a single binary record
    async fn write(
        &mut self,
        provider: &str,
        topic: &str,
        record: Bytes,
    ) -> Result<(), PluginError>;

    /// Emit an ordered sequence of binary records
    async fn write_batch(
        &mut self,
        provider: &str,
        topic: &str,
        records: Vec<Bytes>,
    ) -> Result<(), PluginError>;

    /// Graceful-stop hook
    async fn stop(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Adapts a [`TextPlugin`] to the full [`WriterPlugin`] surface;
/// binary records arrive base64-encoded
pub struct TextAdapter<P>(P);

impl<P: TextPlugin> TextAdapter<P> {
    /// Wrap a text plug-in
    pub fn new(plugin: P) -> Self {
        Self(plugin)
    }
}

#[async_trait]
impl<P: TextPlugin> WriterPlugin for TextAdapter<P> {
    async fn init(&mut self, name: &str, options: &PluginOptions) -> Result<(), PluginError> {
        self.0.init(name, options).await
    }

    async fn write_text(
        &mut self,
        provider: &str,
        topic: &str,
        record: String,
    ) -> Result<(), PluginError> {
        self.0.write(provider, topic, record).await
    }

    async fn write_text_batch(
        &mut self,
        provider: &str,
        topic: &str,
        records: Vec<String>,
    ) -> Result<(), PluginError> {
        self.0.write_batch(provider, topic, records).await
    }

    async fn write_binary(
        &mut self,
        provider: &str,
        topic: &str,
        record: Bytes,
    ) -> Result<(), PluginError> {
        self.0.write(provider, topic, codec::encode(&record)).await
    }

    async fn write_binary_batch(
        &mut self,
        provider: &str,
        topic: &str,
        records: Vec<Bytes>,
    ) -> Result<(), PluginError> {
        let encoded: Vec<String> = codec::encode_iter(records.iter()).collect();
        self.0.write_batch(provider, topic, encoded).await
    }

    async fn stop(&mut self) -> Result<(), PluginError> {
        self.0.stop().await
    }
}

/// Adapts a [`BinaryPlugin`] to the full [`WriterPlugin`] surface;
/// text records arrive as their UTF-8 bytes
pub struct BinaryAdapter<P>(P);

impl<P: BinaryPlugin> BinaryAdapter<P> {
    /// Wrap a binary plug-in
    pub fn new(plugin: P) -> Self {
        Self(plugin)
    }
}

#[async_trait]
impl<P: BinaryPlugin> WriterPlugin for BinaryAdapter<P> {
    async fn init(&mut self, name: &str, options: &PluginOptions) -> Result<(), PluginError> {
        self.0.init(name, options).await
    }

    async fn write_text(
        &mut self,
        provider: &str,
        topic: &str,
        record: String,
    ) -> Result<(), PluginError> {
        self.0
            .write(provider, topic, codec::text_to_binary(record))
            .await
    }

    async fn write_text_batch(
        &mut self,
        provider: &str,
        topic: &str,
        records: Vec<String>,
    ) -> Result<(), PluginError> {
        let converted: Vec<Bytes> = records.into_iter().map(codec::text_to_binary).collect();
        self.0.write_batch(provider, topic, converted).await
    }

    async fn write_binary(
        &mut self,
        provider: &str,
        topic: &str,
        record: Bytes,
    ) -> Result<(), PluginError> {
        self.0.write(provider, topic, record).await
    }

    async fn write_binary_batch(
        &mut self,
        provider: &str,
        topic: &str,
        records: Vec<Bytes>,
    ) -> Result<(), PluginError> {
        self.0.write_batch(provider, topic, records).await
    }

    async fn stop(&mut self) -> Result<(), PluginError> {
        self.0.stop().await
    }
}
