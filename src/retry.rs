use crate::backoff::RetryPolicy;
use crate::event::TelemetryEvent;
use crate::faults::{EntropyRandom, RandomSource};
use crate::ingest::IngestStatus;
use crate::transport::{IngestTransport, TransportError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Observed result of one transmission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Status(IngestStatus),
    Transport(TransportError),
}

impl SendOutcome {
    /// Retryable outcomes: `Overloaded`, timeouts, connection failures, and
    /// transient transport statuses. Everything else ends the loop.
    pub fn is_retryable(&self) -> bool {
        match self {
            SendOutcome::Status(status) => !status.is_terminal(),
            SendOutcome::Transport(err) => err.is_retryable(),
        }
    }

    /// Short label for spans and logs.
    pub fn label(&self) -> &'static str {
        match self {
            SendOutcome::Status(status) => status.as_str(),
            SendOutcome::Transport(TransportError::Timeout) => "timeout",
            SendOutcome::Transport(TransportError::Connection(_)) => "connection_error",
            SendOutcome::Transport(TransportError::UnexpectedStatus(_)) => "unexpected_status",
            SendOutcome::Transport(TransportError::Malformed(_)) => "malformed_response",
            SendOutcome::Transport(TransportError::Config(_)) => "config_error",
        }
    }
}

/// Mutable state of one event's retry loop; created on first transmission and
/// dropped once the event resolves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttemptState {
    /// 0-based index of the most recent transmission.
    pub attempt_number: u32,
    /// Delay chosen before the next transmission, if one is scheduled.
    pub next_backoff: Option<Duration>,
    pub last_outcome: Option<SendOutcome>,
}

impl AttemptState {
    fn record_retry(&mut self, outcome: SendOutcome, backoff: Duration) {
        self.last_outcome = Some(outcome);
        self.next_backoff = Some(backoff);
        self.attempt_number += 1;
    }
}

/// Terminal resolution of one event's delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// A terminal outcome code came back; only `Accepted`, `Duplicate`, or
    /// `Invalid` appear here.
    Resolved(IngestStatus),
    /// The retry budget ran out with only retryable outcomes.
    Exhausted {
        /// Total transmissions made, retries included.
        attempts: u32,
        last_outcome: SendOutcome,
    },
    /// A permanent transport failure, e.g. a malformed response.
    Failed { error: TransportError },
    /// Shutdown interrupted the loop; no further transmission was made.
    Cancelled,
}

/// Cooperative shutdown flag shared between the device loop and in-flight
/// retry loops.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    flag: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Suspension point of the retry loop. The only thing a delivery ever blocks
/// on; implementations must observe shutdown promptly.
pub trait BackoffSleeper {
    /// Waits for `delay`. Returns `false` if shutdown interrupted the wait.
    fn sleep(&mut self, delay: Duration, shutdown: &ShutdownToken) -> bool;
}

const SLEEP_SLICE: Duration = Duration::from_millis(25);

/// Blocking sleeper for dedicated sender threads; polls the shutdown token in
/// short slices so cancellation abandons the remaining backoff.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl BackoffSleeper for ThreadSleeper {
    fn sleep(&mut self, delay: Duration, shutdown: &ShutdownToken) -> bool {
        let deadline = Instant::now() + delay;
        loop {
            if shutdown.is_triggered() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

/// Sender-side delivery client: drives the retry state machine for one event
/// at a time over an injected transport.
///
/// `Pending → Sent → {terminal, retryable}`, with `retryable → Backoff →
/// Sent` until the budget is spent. All randomness (backoff jitter) flows
/// through the injected source; the sleeper is the loop's only suspension
/// point.
pub struct IngestClient<T: IngestTransport> {
    transport: T,
    policy: RetryPolicy,
    rng: Box<dyn RandomSource>,
    sleeper: Box<dyn BackoffSleeper>,
    telemetry: SendTelemetry,
}

impl<T: IngestTransport> IngestClient<T> {
    /// Client with a blocking sleeper and entropy-seeded jitter.
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self::with_parts(
            transport,
            policy,
            Box::new(EntropyRandom::new()),
            Box::new(ThreadSleeper),
        )
    }

    /// Constructor taking explicit randomness and sleep implementations for
    /// tests.
    pub fn with_parts(
        transport: T,
        policy: RetryPolicy,
        rng: Box<dyn RandomSource>,
        sleeper: Box<dyn BackoffSleeper>,
    ) -> Self {
        Self {
            transport,
            policy,
            rng,
            sleeper,
            telemetry: SendTelemetry::default(),
        }
    }

    /// Recorded telemetry: spans, attempt logs, and counters.
    pub fn telemetry(&self) -> &SendTelemetry {
        &self.telemetry
    }

    /// Delivers one event, retrying retryable outcomes with bounded jittered
    /// backoff. Terminal outcomes end the loop immediately regardless of the
    /// remaining budget.
    pub fn deliver_with_retry(
        &mut self,
        event: &TelemetryEvent,
        shutdown: &ShutdownToken,
    ) -> Delivery {
        let mut state = AttemptState::default();
        loop {
            if shutdown.is_triggered() {
                return Delivery::Cancelled;
            }
            self.telemetry.record_log(AttemptLog {
                sequence_id: event.sequence_id,
                attempt: state.attempt_number,
                message: "attempt_start".into(),
            });
            let started = Instant::now();
            let outcome = match self.transport.send(event) {
                Ok(response) => SendOutcome::Status(response.status),
                Err(err) => SendOutcome::Transport(err),
            };
            self.telemetry.metrics.attempts_total += 1;
            self.telemetry.record_span(AttemptSpan {
                sequence_id: event.sequence_id,
                attempt: state.attempt_number,
                duration_ms: started.elapsed().as_millis() as u64,
                outcome: outcome.label(),
            });

            if !outcome.is_retryable() {
                return match outcome {
                    SendOutcome::Status(status) => Delivery::Resolved(status),
                    SendOutcome::Transport(error) => Delivery::Failed { error },
                };
            }
            if state.attempt_number >= self.policy.max_retries {
                self.telemetry.metrics.exhausted_total += 1;
                return Delivery::Exhausted {
                    attempts: state.attempt_number + 1,
                    last_outcome: outcome,
                };
            }
            let backoff = self
                .policy
                .backoff_delay(state.attempt_number, self.rng.as_mut());
            self.telemetry.record_log(AttemptLog {
                sequence_id: event.sequence_id,
                attempt: state.attempt_number,
                message: format!("retrying_after_backoff ms={}", backoff.as_millis()),
            });
            state.record_retry(outcome, backoff);
            self.telemetry.metrics.retries_total += 1;
            if !self.sleeper.sleep(backoff, shutdown) {
                return Delivery::Cancelled;
            }
        }
    }
}

/// In-memory sender telemetry accumulated around the delivery hot path.
#[derive(Debug, Default, Clone)]
pub struct SendTelemetry {
    spans: Vec<AttemptSpan>,
    logs: Vec<AttemptLog>,
    metrics: SenderMetrics,
}

impl SendTelemetry {
    pub fn spans(&self) -> &[AttemptSpan] {
        &self.spans
    }

    pub fn logs(&self) -> &[AttemptLog] {
        &self.logs
    }

    pub fn metrics(&self) -> &SenderMetrics {
        &self.metrics
    }

    /// Renders sender counters as Prometheus exposition text.
    pub fn render_metrics(&self) -> String {
        format!(
            "edgeline_send_attempts_total {}\nedgeline_send_retries_total {}\nedgeline_send_exhausted_total {}\n",
            self.metrics.attempts_total, self.metrics.retries_total, self.metrics.exhausted_total
        )
    }

    fn record_span(&mut self, span: AttemptSpan) {
        self.spans.push(span);
    }

    fn record_log(&mut self, log: AttemptLog) {
        self.logs.push(log);
    }
}

/// One transmission attempt, timed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptSpan {
    pub sequence_id: i64,
    pub attempt: u32,
    pub duration_ms: u64,
    pub outcome: &'static str,
}

/// Structured log line emitted around the delivery loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptLog {
    pub sequence_id: i64,
    pub attempt: u32,
    pub message: String,
}

/// Sender counters surfaced next to the receiver's `/metrics`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SenderMetrics {
    pub attempts_total: u64,
    pub retries_total: u64,
    pub exhausted_total: u64,
}
