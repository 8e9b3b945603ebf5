use crate::dedup::{DedupCache, DedupConfig, DedupDecision};
use crate::event::{SystemWallClock, TelemetryEvent, ValidationError, WallClock};
use crate::faults::{EntropyRandom, OverloadGate, RandomSource};
use crate::metrics::IngestMetrics;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Outcome of one ingestion attempt, as seen by both ends of the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStatus {
    Accepted,
    /// The original was already accepted; the sender must not retry.
    Duplicate,
    /// Receiver self-throttling; the sender should back off and retry.
    Overloaded,
    /// Structurally malformed; retrying can never succeed.
    Invalid,
}

impl IngestStatus {
    /// Terminal statuses end the sender's retry loop immediately.
    pub fn is_terminal(self) -> bool {
        !matches!(self, IngestStatus::Overloaded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IngestStatus::Accepted => "accepted",
            IngestStatus::Duplicate => "duplicate",
            IngestStatus::Overloaded => "overloaded",
            IngestStatus::Invalid => "invalid",
        }
    }
}

/// Per-request decision record surfaced to the transport layer and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub status: IngestStatus,
    pub reason: &'static str,
    pub correlation_id: String,
}

/// Receiver-side configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    pub dedup: DedupConfig,
    /// Probability of the synthetic overload gate firing per request.
    pub p_overload: f64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            dedup: DedupConfig::default(),
            p_overload: 0.10,
        }
    }
}

/// Idempotent ingestion endpoint.
///
/// Serves concurrent requests through `&self`; the dedup cache is the only
/// shared mutable resource and carries its own per-shard locking.
pub struct Receiver {
    cache: DedupCache,
    metrics: IngestMetrics,
    overload: OverloadGate,
    clock: Box<dyn WallClock + Send + Sync>,
    correlation_seq: AtomicU64,
}

impl Receiver {
    /// Receiver wired to the system clock and an entropy-seeded overload roll.
    pub fn new(config: ReceiverConfig) -> Self {
        Self::with_parts(
            config,
            Box::new(EntropyRandom::new()),
            Box::new(SystemWallClock),
        )
    }

    /// Constructor taking explicit randomness and time sources for tests.
    pub fn with_parts(
        config: ReceiverConfig,
        overload_rng: Box<dyn RandomSource + Send>,
        clock: Box<dyn WallClock + Send + Sync>,
    ) -> Self {
        Self {
            cache: DedupCache::new(config.dedup),
            metrics: IngestMetrics::new(),
            overload: OverloadGate::new(config.p_overload, overload_rng),
            clock,
            correlation_seq: AtomicU64::new(1),
        }
    }

    /// Classifies one inbound event.
    ///
    /// Order matters: the overload roll runs before the dedup check so a
    /// throttled request never consumes its dedup slot, keeping the
    /// inevitable retry acceptable as fresh.
    pub fn ingest(&self, event: &TelemetryEvent) -> IngestReport {
        let correlation_id = self.next_correlation_id();
        self.metrics.incr_received();

        let key = match event.validate() {
            Ok(key) => key,
            Err(err) => {
                self.metrics.incr_rejected();
                return IngestReport {
                    status: IngestStatus::Invalid,
                    reason: rejection_reason(&err),
                    correlation_id,
                };
            }
        };

        if self.overload.fires() {
            self.metrics.incr_transient();
            return IngestReport {
                status: IngestStatus::Overloaded,
                reason: "simulated_backpressure",
                correlation_id,
            };
        }

        match self.cache.check_and_record(&key, self.clock.now_ms()) {
            DedupDecision::Duplicate => {
                self.metrics.incr_duplicates();
                IngestReport {
                    status: IngestStatus::Duplicate,
                    reason: "already_processed",
                    correlation_id,
                }
            }
            DedupDecision::Fresh => {
                self.metrics.incr_accepted();
                IngestReport {
                    status: IngestStatus::Accepted,
                    reason: "new_message",
                    correlation_id,
                }
            }
        }
    }

    pub fn metrics(&self) -> &IngestMetrics {
        &self.metrics
    }

    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }

    fn next_correlation_id(&self) -> String {
        let seq = self.correlation_seq.fetch_add(1, Ordering::Relaxed);
        format!("c-{seq:08x}")
    }
}

impl std::fmt::Debug for Receiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Receiver")
            .field("cache", &self.cache)
            .field("overload", &self.overload)
            .finish()
    }
}

fn rejection_reason(err: &ValidationError) -> &'static str {
    match err {
        ValidationError::MissingSourceId => "missing_source_id",
        ValidationError::NegativeSequence { .. } => "invalid_sequence_id",
    }
}
