//! Driver Operation Metrics
//!
//! Lock-free counters recording how many round trips each driver operation
//! made. Used to verify the access layer's call patterns (for example that a
//! natural-key hit never triggers a second, id-based read) and to report
//! traffic from the dev tool.
//!
//! # Usage
//!
//! ```rust
//! use studyhub_core::db::{DriverMetrics, DriverOperation};
//!
//! let metrics = DriverMetrics::new();
//! metrics.record(DriverOperation::Get);
//! metrics.record(DriverOperation::Query);
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.gets, 1);
//! assert_eq!(snapshot.total(), 2);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Kind of driver round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverOperation {
    Get,
    Query,
    Insert,
    Update,
    Delete,
}

/// Per-operation round-trip counters
#[derive(Debug, Default)]
pub struct DriverMetrics {
    gets: AtomicU64,
    queries: AtomicU64,
    inserts: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
}

/// Point-in-time copy of `DriverMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub gets: u64,
    pub queries: u64,
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
}

impl DriverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one round trip of `operation`
    pub fn record(&self, operation: DriverOperation) {
        let counter = match operation {
            DriverOperation::Get => &self.gets,
            DriverOperation::Query => &self.queries,
            DriverOperation::Insert => &self.inserts,
            DriverOperation::Update => &self.updates,
            DriverOperation::Delete => &self.deletes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            gets: self.gets.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }

    /// Reset every counter to zero
    pub fn reset(&self) {
        for counter in [
            &self.gets,
            &self.queries,
            &self.inserts,
            &self.updates,
            &self.deletes,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl MetricsSnapshot {
    pub fn total(&self) -> u64 {
        self.gets + self.queries + self.inserts + self.updates + self.deletes
    }

    /// Counter growth since an earlier snapshot
    pub fn since(&self, earlier: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            gets: self.gets.saturating_sub(earlier.gets),
            queries: self.queries.saturating_sub(earlier.queries),
            inserts: self.inserts.saturating_sub(earlier.inserts),
            updates: self.updates.saturating_sub(earlier.updates),
            deletes: self.deletes.saturating_sub(earlier.deletes),
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gets={} queries={} inserts={} updates={} deletes={}",
            self.gets, self.queries, self.inserts, self.updates, self.deletes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_reset() {
        let metrics = DriverMetrics::new();
        metrics.record(DriverOperation::Insert);
        metrics.record(DriverOperation::Get);
        metrics.record(DriverOperation::Get);

        let before = metrics.snapshot();
        assert_eq!(before.inserts, 1);
        assert_eq!(before.gets, 2);

        metrics.record(DriverOperation::Delete);
        let delta = metrics.snapshot().since(&before);
        assert_eq!(
            delta,
            MetricsSnapshot {
                deletes: 1,
                ..Default::default()
            }
        );

        metrics.reset();
        assert_eq!(metrics.snapshot().total(), 0);
    }

    #[test]
    fn test_snapshot_display() {
        let snapshot = MetricsSnapshot {
            gets: 1,
            queries: 2,
            ..Default::default()
        };
        assert_eq!(
            snapshot.to_string(),
            "gets=1 queries=2 inserts=0 updates=0 deletes=0"
        );
    }
}
