//! Relay - Writers
//!
//! The delivery half of the pipeline: writers consume records from the
//! router and emit them to an external output.
//!
//! # Architecture
//!
//! ```text
//! [Router worker] → TransformerWriter → Writer (enqueue) → WorkPool
//!                                                             ↓
//!                                          consumer task → WriterPlugin hooks
//! ```
//!
//! - [`WorkPool`] - four unbounded concurrent FIFO queues, one per payload
//!   shape, with a wake signal for parked consumers
//! - [`Writer`] - the runloop base: lifecycle state machine, its own
//!   `WorkPool`, and one consumer task driving an injected [`WriterPlugin`]
//! - [`TextAdapter`] / [`BinaryAdapter`] - codec adapters so a plug-in only
//!   implements the payload family it natively speaks
//! - [`TransformerWriter`] - the route binding that batches, transforms, and
//!   forwards to a destination writer
//! - [`StdoutPlugin`] / [`NullPlugin`] - built-in plug-ins for debugging and
//!   for measuring the pipeline without I/O
//!
//! Writers provide at-most-once delivery: enqueue never blocks, nothing is
//! durable, and records still queued when the process exits are lost.

mod adapter;
mod null;
mod plugin;
mod pool;
pub mod registry;
mod stdout;
mod transformer;
mod writer;

pub use adapter::{BinaryAdapter, BinaryPlugin, TextAdapter, TextPlugin};
pub use null::{NullCounters, NullPlugin};
pub use plugin::{PluginOptions, WriterPlugin};
pub use pool::WorkPool;
pub use registry::{WriterFactory, WriterRegistry};
pub use stdout::StdoutPlugin;
pub use transformer::TransformerWriter;
pub use writer::Writer;
