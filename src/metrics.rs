use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receiver-side monotonic counters, one owned instance passed by reference
/// to request handlers. Increments are atomic but not linearized with the
/// dedup decision; they reset only when the receiver restarts.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    received_total: AtomicU64,
    accepted_total: AtomicU64,
    duplicates_total: AtomicU64,
    rejected_total: AtomicU64,
    transient_total: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_received(&self) {
        self.received_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_accepted(&self) {
        self.accepted_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_duplicates(&self) {
        self.duplicates_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn incr_transient(&self) {
        self.transient_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time view of all counters, consistent at the moment of the
    /// call but not transactionally synchronized with in-flight ingests.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received_total: self.received_total.load(Ordering::Relaxed),
            accepted_total: self.accepted_total.load(Ordering::Relaxed),
            duplicates_total: self.duplicates_total.load(Ordering::Relaxed),
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            transient_total: self.transient_total.load(Ordering::Relaxed),
        }
    }
}

/// Read-only counter values served at `/metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub received_total: u64,
    pub accepted_total: u64,
    pub duplicates_total: u64,
    pub rejected_total: u64,
    pub transient_total: u64,
}

impl MetricsSnapshot {
    /// Renders the counters as Prometheus exposition text.
    pub fn render_prometheus(&self) -> String {
        format!(
            "edgeline_received_total {}\nedgeline_accepted_total {}\nedgeline_duplicates_total {}\nedgeline_rejected_total {}\nedgeline_transient_total {}\n",
            self.received_total,
            self.accepted_total,
            self.duplicates_total,
            self.rejected_total,
            self.transient_total
        )
    }
}
