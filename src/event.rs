use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// A single logical telemetry measurement produced by one source.
///
/// An event is created once but may cross the wire many times (retries,
/// transport duplicates); its identity for deduplication purposes is the
/// `(source_id, sequence_id)` pair, never the payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryEvent {
    pub source_id: String,
    /// Strictly increasing per source. Carried signed on the wire so the
    /// receiver can reject negative values instead of failing to decode.
    pub sequence_id: i64,
    pub timestamp_ms: u64,
    /// Opaque to the receiver.
    pub payload: Vec<u8>,
}

impl TelemetryEvent {
    /// Validates structural fields and returns the idempotency key.
    pub fn validate(&self) -> Result<EventKey, ValidationError> {
        if self.source_id.trim().is_empty() {
            return Err(ValidationError::MissingSourceId);
        }
        if self.sequence_id < 0 {
            return Err(ValidationError::NegativeSequence {
                sequence_id: self.sequence_id,
            });
        }
        Ok(EventKey {
            source_id: self.source_id.clone(),
            sequence_id: self.sequence_id as u64,
        })
    }
}

/// Idempotency key recognizing repeat submissions of the same logical event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    pub source_id: String,
    pub sequence_id: u64,
}

/// Structural validation failures. Terminal: the sender must never retry them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("source_id must not be empty")]
    MissingSourceId,
    #[error("sequence_id must be >= 0, got {sequence_id}")]
    NegativeSequence { sequence_id: i64 },
}

/// Wall-clock source injected into time-sensitive components so tests can
/// drive time explicitly.
pub trait WallClock {
    fn now_ms(&self) -> u64;
}

/// System wall clock reporting milliseconds since the Unix epoch.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis().min(u128::from(u64::MAX)) as u64)
            .unwrap_or(0)
    }
}
