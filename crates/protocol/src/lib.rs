//! Relay - Protocol
//!
//! Core types shared by every stage of the ingest pipeline.
//!
//! # Overview
//!
//! Records move through relay as `(source, topic, payload)` triples, where the
//! payload is one of four shapes: a single text record, a single binary
//! record, or an ordered sequence of either. This crate defines:
//!
//! - [`MessageTuple`] - the immutable record triple
//! - [`RunState`] / [`RunStateCell`] - the lifecycle state machine every
//!   long-lived component follows
//! - [`RecordWriter`] - the fan-in trait implemented by anything records can
//!   be written into (the router, writers, work pools)
//! - [`codec`] - base64 and UTF-8 conversions used at text/binary boundaries
//! - [`PluginError`] - the error contract for source/writer plug-ins
//!
//! # Design
//!
//! Everything here is deliberately dependency-light: the rest of the
//! workspace builds on these types, so this crate must not pull in the
//! runtime or any transport.

pub mod codec;
mod error;
mod state;
mod tuple;
mod writer;

pub use error::{CodecError, PluginError};
pub use state::{RunState, RunStateCell};
pub use tuple::MessageTuple;
pub use writer::RecordWriter;
