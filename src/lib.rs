//! Device-to-edge telemetry ingestion over an unreliable transport.
//!
//! Two cooperating halves keep the path correct under dropped, duplicated,
//! and throttled requests: the receiver's idempotent acceptance built on a
//! time-bounded dedup cache, and the sender's jittered exponential retry
//! loop. Dedup state is in-memory only; a receiver restart forgets history.

pub mod app;
pub mod backoff;
pub mod config;
pub mod dedup;
pub mod device;
pub mod event;
pub mod faults;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod observability;
pub mod retry;
pub mod transport;
pub mod wire;

pub use app::RuntimeOptions;
pub use backoff::RetryPolicy;
pub use config::{ConfigError, ServiceConfig};
pub use dedup::{DedupCache, DedupConfig, DedupDecision};
pub use device::{
    DeviceConfig, DeviceError, DeviceLoop, DeviceStats, TelemetryGenerator, TelemetryReading,
};
pub use event::{EventKey, SystemWallClock, TelemetryEvent, ValidationError, WallClock};
pub use faults::{sample_range, EntropyRandom, FaultProfile, OverloadGate, RandomSource};
pub use ingest::{IngestReport, IngestStatus, Receiver, ReceiverConfig};
pub use logging::{JsonLineLogger, LogFile, LogLevel, LogRotationPolicy, LoggingError};
pub use metrics::{IngestMetrics, MetricsSnapshot};
pub use observability::{HealthzStatus, MetricsEnvelope, ObservabilityService};
pub use retry::{
    AttemptLog, AttemptSpan, AttemptState, BackoffSleeper, Delivery, IngestClient, SendOutcome,
    SendTelemetry, SenderMetrics, ShutdownToken, ThreadSleeper,
};
pub use transport::{
    FaultyTransport, HttpIngestTransport, IngestResponse, IngestTransport, LoopbackTransport,
    TransportError,
};
pub use wire::{
    WireError, WireIngestRequest, WireIngestResponse, HEALTHZ_PATH, INGEST_PATH, METRICS_PATH,
};
