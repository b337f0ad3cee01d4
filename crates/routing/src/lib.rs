//! Relay - Routing
//!
//! The route table maps `(source, topic)` pairs to transformer-writer
//! bindings. It is rebuilt - never mutated in place - by reconciling against
//! a fresh set of route descriptors: insert or replace everything the
//! descriptors name, then prune everything they no longer name.
//!
//! # Concurrency
//!
//! A `RouteTable` is write-once-then-readable. The router clones the current
//! table, reconciles the clone, and publishes it with one atomic pointer
//! swap; lookups go through the published pointer without locks and never
//! observe a half-updated table.
//!
//! # Topic matching
//!
//! Exact match first. A registered topic ending in `/*` matches any incoming
//! topic equal to, or nested one or more segments under, the prefix:
//! `a/b/*` matches `a/b`, `a/b/c`, and `a/b/anything`, but not `a/bc`.
//! Precedence among overlapping wildcards is unspecified - the first match
//! in scan order wins.

mod descriptor;
mod table;
mod targets;


pub use descriptor::RouteDescriptor;
pub use table::{topic_match, RouteBinding, RouteTable};
pub use targets::RouteTargets;
