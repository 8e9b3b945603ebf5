use edgeline::{
    IngestStatus, RandomSource, Receiver, ReceiverConfig, TelemetryEvent, WallClock,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Replays scripted unit rolls; returns 1.0 (never fires a gate) once empty.
struct ScriptedRandom {
    rolls: VecDeque<f64>,
}

impl ScriptedRandom {
    fn new(rolls: &[f64]) -> Self {
        Self {
            rolls: rolls.iter().copied().collect(),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(1.0)
    }
}

#[derive(Clone)]
struct FixedClock {
    now_ms: Arc<AtomicU64>,
}

impl FixedClock {
    fn at(now_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(now_ms)),
        }
    }

    fn advance(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl WallClock for FixedClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

fn quiet_receiver() -> Receiver {
    // No overload rolls scripted, so the gate never fires.
    Receiver::with_parts(
        ReceiverConfig::default(),
        Box::new(ScriptedRandom::new(&[])),
        Box::new(FixedClock::at(1_000)),
    )
}

fn event(source: &str, sequence: i64) -> TelemetryEvent {
    TelemetryEvent {
        source_id: source.to_string(),
        sequence_id: sequence,
        timestamp_ms: 1_000,
        payload: br#"{"temperature":21.5}"#.to_vec(),
    }
}

#[test]
fn accepts_then_flags_duplicate_with_counters() {
    let receiver = quiet_receiver();
    let first = receiver.ingest(&event("device-001", 10));
    assert_eq!(first.status, IngestStatus::Accepted);
    assert_eq!(first.reason, "new_message");

    let second = receiver.ingest(&event("device-001", 10));
    assert_eq!(second.status, IngestStatus::Duplicate);
    assert_eq!(second.reason, "already_processed");
    assert_ne!(first.correlation_id, second.correlation_id);

    let snapshot = receiver.metrics().snapshot();
    assert_eq!(snapshot.received_total, 2);
    assert_eq!(snapshot.accepted_total, 1);
    assert_eq!(snapshot.duplicates_total, 1);
    assert_eq!(snapshot.rejected_total, 0);
    assert_eq!(snapshot.transient_total, 0);
}

#[test]
fn negative_sequence_is_invalid_and_never_cached() {
    let receiver = quiet_receiver();
    let report = receiver.ingest(&event("device-001", -1));
    assert_eq!(report.status, IngestStatus::Invalid);
    assert_eq!(report.reason, "invalid_sequence_id");
    assert_eq!(receiver.cache().occupancy(), 0);
    let snapshot = receiver.metrics().snapshot();
    assert_eq!(snapshot.rejected_total, 1);
    assert_eq!(snapshot.accepted_total, 0);
}

#[test]
fn empty_source_is_invalid() {
    let receiver = quiet_receiver();
    let report = receiver.ingest(&event("  ", 1));
    assert_eq!(report.status, IngestStatus::Invalid);
    assert_eq!(report.reason, "missing_source_id");
}

#[test]
fn overload_does_not_consume_the_dedup_slot() {
    // First roll fires the gate (0.05 < 0.10), second does not.
    let receiver = Receiver::with_parts(
        ReceiverConfig::default(),
        Box::new(ScriptedRandom::new(&[0.05, 0.99])),
        Box::new(FixedClock::at(1_000)),
    );
    let throttled = receiver.ingest(&event("device-001", 15));
    assert_eq!(throttled.status, IngestStatus::Overloaded);
    assert_eq!(throttled.reason, "simulated_backpressure");
    assert_eq!(receiver.cache().occupancy(), 0);

    // The resubmission of the same key must land as fresh, not duplicate.
    let retried = receiver.ingest(&event("device-001", 15));
    assert_eq!(retried.status, IngestStatus::Accepted);
    assert_eq!(receiver.cache().occupancy(), 1);

    let snapshot = receiver.metrics().snapshot();
    assert_eq!(snapshot.received_total, 2);
    assert_eq!(snapshot.transient_total, 1);
    assert_eq!(snapshot.accepted_total, 1);
    assert_eq!(snapshot.duplicates_total, 0);
}

#[test]
fn sequence_gaps_are_not_errors() {
    let receiver = quiet_receiver();
    assert_eq!(
        receiver.ingest(&event("device-001", 5)).status,
        IngestStatus::Accepted
    );
    // Sequence 6 was lost in transit and never arrives.
    assert_eq!(
        receiver.ingest(&event("device-001", 7)).status,
        IngestStatus::Accepted
    );
    let snapshot = receiver.metrics().snapshot();
    assert_eq!(snapshot.accepted_total, 2);
    assert_eq!(snapshot.rejected_total, 0);
    assert_eq!(receiver.cache().occupancy(), 2);
}

#[test]
fn reaccepts_after_ttl_expiry() {
    let clock = FixedClock::at(1_000);
    let receiver = Receiver::with_parts(
        ReceiverConfig::default(),
        Box::new(ScriptedRandom::new(&[])),
        Box::new(clock.clone()),
    );
    assert_eq!(
        receiver.ingest(&event("device-001", 1)).status,
        IngestStatus::Accepted
    );
    clock.advance(300_001);
    assert_eq!(
        receiver.ingest(&event("device-001", 1)).status,
        IngestStatus::Accepted
    );
    assert_eq!(receiver.metrics().snapshot().accepted_total, 2);
}
