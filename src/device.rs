use crate::backoff::RetryPolicy;
use crate::event::{SystemWallClock, TelemetryEvent, WallClock};
use crate::faults::{sample_range, FaultProfile, RandomSource};
use crate::ingest::IngestStatus;
use crate::retry::{BackoffSleeper, Delivery, IngestClient, ShutdownToken, ThreadSleeper};
use crate::transport::IngestTransport;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Sensor reading carried as the event payload. The receiver never looks
/// inside; only the device and downstream consumers decode it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

/// Device-side configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub source_id: String,
    pub interval_seconds: f64,
    /// First sequence id the generator emits.
    pub sequence_floor: u64,
    pub request_timeout_seconds: f64,
    pub faults: FaultProfile,
    pub retry: RetryPolicy,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            source_id: "device-001".to_string(),
            interval_seconds: 3.0,
            sequence_floor: 0,
            request_timeout_seconds: 5.0,
            faults: FaultProfile::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl DeviceConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_seconds.max(0.0))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_seconds.max(0.0))
    }
}

/// Errors raised while producing telemetry.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to encode telemetry reading: {0}")]
    EncodeReading(#[from] serde_json::Error),
}

/// Produces one logical measurement per call with a strictly increasing
/// sequence id starting at the configured floor.
pub struct TelemetryGenerator {
    source_id: String,
    next_sequence: u64,
    rng: Box<dyn RandomSource>,
}

impl TelemetryGenerator {
    pub fn new(source_id: impl Into<String>, sequence_floor: u64, rng: Box<dyn RandomSource>) -> Self {
        Self {
            source_id: source_id.into(),
            next_sequence: sequence_floor,
            rng,
        }
    }

    /// Sequence id the next event will carry.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Creates the next event. Each call consumes one sequence id whether or
    /// not the event is ever delivered; gaps are expected and benign.
    pub fn next_event(&mut self, now_ms: u64) -> Result<TelemetryEvent, DeviceError> {
        let reading = self.reading();
        let payload = serde_json::to_vec(&reading)?;
        let sequence_id = self.next_sequence;
        self.next_sequence += 1;
        Ok(TelemetryEvent {
            source_id: self.source_id.clone(),
            sequence_id: sequence_id as i64,
            timestamp_ms: now_ms,
            payload,
        })
    }

    fn reading(&mut self) -> TelemetryReading {
        TelemetryReading {
            temperature: sample_range(self.rng.as_mut(), 18.0, 28.0),
            humidity: sample_range(self.rng.as_mut(), 30.0, 70.0),
            pressure: sample_range(self.rng.as_mut(), 980.0, 1020.0),
        }
    }
}

/// Per-run delivery tally. Exhaustion counts here instead of halting the
/// loop; losing an event is an observable outcome, not a failure of the
/// device process.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStats {
    pub produced: u64,
    pub accepted: u64,
    pub duplicates_acked: u64,
    pub invalid: u64,
    pub exhausted: u64,
    pub failed: u64,
    pub cancelled: u64,
}

/// Device main loop: generate, deliver with retry, tally, pace.
///
/// Each event's retry loop runs to resolution before the next event is
/// produced; different sequence numbers share nothing but the transport.
pub struct DeviceLoop<T: IngestTransport> {
    generator: TelemetryGenerator,
    client: IngestClient<T>,
    interval: Duration,
    shutdown: ShutdownToken,
    clock: Box<dyn WallClock>,
    sleeper: Box<dyn BackoffSleeper>,
    stats: DeviceStats,
}

impl<T: IngestTransport> DeviceLoop<T> {
    pub fn new(
        generator: TelemetryGenerator,
        client: IngestClient<T>,
        interval: Duration,
        shutdown: ShutdownToken,
    ) -> Self {
        Self::with_parts(
            generator,
            client,
            interval,
            shutdown,
            Box::new(SystemWallClock),
            Box::new(ThreadSleeper),
        )
    }

    /// Constructor taking explicit clock and sleeper for tests.
    pub fn with_parts(
        generator: TelemetryGenerator,
        client: IngestClient<T>,
        interval: Duration,
        shutdown: ShutdownToken,
        clock: Box<dyn WallClock>,
        sleeper: Box<dyn BackoffSleeper>,
    ) -> Self {
        Self {
            generator,
            client,
            interval,
            shutdown,
            clock,
            sleeper,
            stats: DeviceStats::default(),
        }
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    pub fn client(&self) -> &IngestClient<T> {
        &self.client
    }

    /// Runs until shutdown or until `max_events` events have been produced.
    pub fn run(&mut self, max_events: Option<u64>) -> Result<DeviceStats, DeviceError> {
        while !self.shutdown.is_triggered() {
            if let Some(budget) = max_events {
                if self.stats.produced >= budget {
                    break;
                }
            }
            let event = self.generator.next_event(self.clock.now_ms())?;
            self.stats.produced += 1;
            let delivery = self.client.deliver_with_retry(&event, &self.shutdown);
            self.tally(&delivery);
            if matches!(delivery, Delivery::Cancelled) {
                break;
            }
            if !self.sleeper.sleep(self.interval, &self.shutdown) {
                break;
            }
        }
        Ok(self.stats)
    }

    fn tally(&mut self, delivery: &Delivery) {
        match delivery {
            Delivery::Resolved(IngestStatus::Accepted) => self.stats.accepted += 1,
            // A duplicate ack means the original already landed.
            Delivery::Resolved(IngestStatus::Duplicate) => self.stats.duplicates_acked += 1,
            Delivery::Resolved(_) => self.stats.invalid += 1,
            Delivery::Exhausted { .. } => self.stats.exhausted += 1,
            Delivery::Failed { .. } => self.stats.failed += 1,
            Delivery::Cancelled => self.stats.cancelled += 1,
        }
    }
}
