//! Relay - Pipeline
//!
//! The concurrent dispatch core. The [`Router`] is the single place every
//! source writes into: records stage in a work pool, a pool of scavenger
//! workers resolves each against the current [`RouteTable`], and matched
//! records go out through their transformer-writer binding. Unrouteable
//! records are dropped silently - that is the contract.
//!
//! The route table is refreshed out-of-band: a [`MetaRegistry`] produces the
//! authoritative descriptor set, and a refresher task periodically
//! reconciles a private clone of the table before publishing it with one
//! atomic pointer swap. A failed fetch retains the previous table.

mod error;
mod metrics;
pub mod registry;
mod router;

pub use error::RegistryError;
pub use metrics::{RouterMetrics, RouterSnapshot};
pub use registry::{parse_route_document, HttpRegistry, MetaRegistry, StaticRegistry};
pub use router::Router;
