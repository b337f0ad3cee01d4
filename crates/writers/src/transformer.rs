//! The transformer-writer binding
//!
//! A `TransformerWriter` is what a route resolves to: one optional
//! transformer, one destination writer, the destination `(provider, topic)`
//! pair, and a batch ceiling. It is the only object the router invokes to
//! dispatch a record.
//!
//! Binary records pass through the text-shaped transformer base64-encoded
//! and are decoded again before forwarding; pass-through routes skip the
//! codec round-trip entirely.

use std::sync::Arc;

use bytes::Bytes;

use relay_protocol::{codec, RecordWriter, RunState, RunStateCell};
use relay_transform::Transformer;

use crate::writer::Writer;

#[cfg(test)]
#[path = "transformer_test.rs"]
mod transformer_test;

/// A route binding: optional transformer, destination writer, batch ceiling
pub struct TransformerWriter {
    transformer: Option<Arc<dyn Transformer>>,
    writer: Arc<Writer>,
    dest_provider: String,
    dest_topic: String,
    max_batch_size: usize,
    state: RunStateCell,
}

impl TransformerWriter {
    /// Create a binding. A `None` transformer is a pass-through; batch
    /// ceilings of zero disable batching (the whole sequence goes through in
    /// one call).
    pub fn new(
        transformer: Option<Arc<dyn Transformer>>,
        writer: Arc<Writer>,
        dest_provider: impl Into<String>,
        dest_topic: impl Into<String>,
        max_batch_size: usize,
    ) -> Self {
        Self {
            transformer,
            writer,
            dest_provider: dest_provider.into(),
            dest_topic: dest_topic.into(),
            max_batch_size,
            state: RunStateCell::new(),
        }
    }

    /// Whether this binding transforms records or passes them through
    #[inline]
    pub fn is_passthrough(&self) -> bool {
        self.transformer.is_none()
    }

    /// The destination writer name
    #[inline]
    pub fn dest_provider(&self) -> &str {
        &self.dest_provider
    }

    /// The destination topic
    #[inline]
    pub fn dest_topic(&self) -> &str {
        &self.dest_topic
    }

    /// Mark the binding initialized. Idempotent after success; the
    /// transformer itself was configured at construction and the destination
    /// writer has its own lifecycle.
    pub fn initialize(&self) -> bool {
        if !self
            .state
            .begin_transition(&[RunState::Created, RunState::FailedInitialization])
        {
            return self.state.initialized();
        }
        self.state.complete(RunState::Initialized);
        true
    }

    /// State-only start: the binding owns no task
    pub fn start(&self) -> bool {
        if !self.state.begin_transition(&[
            RunState::Initialized,
            RunState::Stopped,
            RunState::Failed,
        ]) {
            return false;
        }
        self.state.complete(RunState::Running);
        true
    }

    /// State-only stop
    pub fn stop(&self) -> bool {
        if !self.state.begin_transition(&[RunState::Running]) {
            return false;
        }
        self.state.complete(RunState::Stopped);
        true
    }

    /// Observable state follows the destination writer
    #[inline]
    pub fn state(&self) -> RunState {
        self.writer.state()
    }

    /// Deliver a single text record
    pub async fn write_text(&self, source: &str, topic: &str, record: String) -> bool {
        match &self.transformer {
            None => self
                .writer
                .write_text(&self.dest_provider, &self.dest_topic, record),
            Some(t) => match t.transform_one(source, topic, record).await {
                Ok(Some(out)) => self
                    .writer
                    .write_text(&self.dest_provider, &self.dest_topic, out),
                Ok(None) => false,
                Err(e) => {
                    tracing::warn!(
                        transformer = t.name(),
                        source,
                        topic,
                        error = %e,
                        "transform failed, record dropped"
                    );
                    false
                }
            },
        }
    }

    /// Deliver an ordered text sequence, honoring the batch ceiling.
    ///
    /// With a ceiling of `k > 0` the sequence is partitioned into contiguous
    /// slices of up to `k` records; each slice is materialized (the
    /// destination consumes it asynchronously) and delivered on its own.
    /// Returns the AND of per-slice results.
    pub async fn write_text_batch(&self, source: &str, topic: &str, records: Vec<String>) -> bool {
        if records.is_empty() {
            return true;
        }
        if self.max_batch_size == 0 {
            return self.deliver_text(source, topic, records).await;
        }
        let mut ok = true;
        for chunk in records.chunks(self.max_batch_size) {
            ok &= self.deliver_text(source, topic, chunk.to_vec()).await;
        }
        ok
    }

    async fn deliver_text(&self, source: &str, topic: &str, records: Vec<String>) -> bool {
        match &self.transformer {
            None => self
                .writer
                .write_text_batch(&self.dest_provider, &self.dest_topic, records),
            Some(t) => match t.transform_many(source, topic, records).await {
                Ok(Some(out)) => self
                    .writer
                    .write_text_batch(&self.dest_provider, &self.dest_topic, out),
                Ok(None) => false,
                Err(e) => {
                    tracing::warn!(
                        transformer = t.name(),
                        source,
                        topic,
                        error = %e,
                        "transform failed, batch dropped"
                    );
                    false
                }
            },
        }
    }

    /// Deliver a single binary record. Transform routes run the record
    /// through base64; pass-through routes forward the bytes untouched.
    pub async fn write_binary(&self, source: &str, topic: &str, record: Bytes) -> bool {
        match &self.transformer {
            None => self
                .writer
                .write_binary(&self.dest_provider, &self.dest_topic, record),
            Some(t) => {
                let encoded = codec::encode(&record);
                match t.transform_one(source, topic, encoded).await {
                    Ok(Some(out)) => match codec::decode(&out) {
                        Ok(bytes) => self.writer.write_binary(
                            &self.dest_provider,
                            &self.dest_topic,
                            bytes,
                        ),
                        Err(e) => {
                            tracing::warn!(
                                transformer = t.name(),
                                source,
                                topic,
                                error = %e,
                                "transformer output is not base64, record dropped"
                            );
                            false
                        }
                    },
                    Ok(None) => false,
                    Err(e) => {
                        tracing::warn!(
                            transformer = t.name(),
                            source,
                            topic,
                            error = %e,
                            "transform failed, record dropped"
                        );
                        false
                    }
                }
            }
        }
    }

    /// Deliver an ordered binary sequence, honoring the batch ceiling.
    /// Transform routes encode each slice lazily on the way in and decode
    /// the transformer's output on the way out.
    pub async fn write_binary_batch(
        &self,
        source: &str,
        topic: &str,
        records: Vec<Bytes>,
    ) -> bool {
        if records.is_empty() {
            return true;
        }
        if self.max_batch_size == 0 {
            return self.deliver_binary(source, topic, records).await;
        }
        let mut ok = true;
        for chunk in records.chunks(self.max_batch_size) {
            ok &= self.deliver_binary(source, topic, chunk.to_vec()).await;
        }
        ok
    }

    async fn deliver_binary(&self, source: &str, topic: &str, records: Vec<Bytes>) -> bool {
        match &self.transformer {
            None => self
                .writer
                .write_binary_batch(&self.dest_provider, &self.dest_topic, records),
            Some(t) => {
                let encoded: Vec<String> = codec::encode_iter(records.iter()).collect();
                match t.transform_many(source, topic, encoded).await {
                    Ok(Some(out)) => match codec::decode_all(out) {
                        Ok(decoded) => self.writer.write_binary_batch(
                            &self.dest_provider,
                            &self.dest_topic,
                            decoded,
                        ),
                        Err(e) => {
                            tracing::warn!(
                                transformer = t.name(),
                                source,
                                topic,
                                error = %e,
                                "transformer output is not base64, batch dropped"
                            );
                            false
                        }
                    },
                    Ok(None) => false,
                    Err(e) => {
                        tracing::warn!(
                            transformer = t.name(),
                            source,
                            topic,
                            error = %e,
                            "transform failed, batch dropped"
                        );
                        false
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for TransformerWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformerWriter")
            .field("dest_provider", &self.dest_provider)
            .field("dest_topic", &self.dest_topic)
            .field("max_batch_size", &self.max_batch_size)
            .field("passthrough", &self.is_passthrough())
            .finish()
    }
}
