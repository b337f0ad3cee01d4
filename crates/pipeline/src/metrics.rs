//! Router metrics
//!
//! Relaxed atomic counters bumped on the hot path, snapshotted for logging
//! and tests.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the router's dataplane and refresh loop
#[derive(Debug, Default)]
pub struct RouterMetrics {
    received: AtomicU64,
    routed: AtomicU64,
    unrouteable: AtomicU64,
    dispatch_failures: AtomicU64,
    refreshes: AtomicU64,
    refresh_failures: AtomicU64,
}

impl RouterMetrics {
    /// Create zeroed metrics
    pub const fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            routed: AtomicU64::new(0),
            unrouteable: AtomicU64::new(0),
            dispatch_failures: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
            refresh_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_routed(&self) {
        self.routed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_unrouteable(&self) {
        self.unrouteable.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dispatch_failure(&self) {
        self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_refresh_failure(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time snapshot of all counters
    pub fn snapshot(&self) -> RouterSnapshot {
        RouterSnapshot {
            received: self.received.load(Ordering::Relaxed),
            routed: self.routed.load(Ordering::Relaxed),
            unrouteable: self.unrouteable.load(Ordering::Relaxed),
            dispatch_failures: self.dispatch_failures.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`RouterMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterSnapshot {
    /// Records accepted into the staging pool
    pub received: u64,
    /// Records dispatched through a route
    pub routed: u64,
    /// Records dropped because no route matched
    pub unrouteable: u64,
    /// Dispatches the destination rejected
    pub dispatch_failures: u64,
    /// Successful route-table refreshes
    pub refreshes: u64,
    /// Refreshes that retained the previous table
    pub refresh_failures: u64,
}
