use crate::event::TelemetryEvent;
use crate::faults::{FaultProfile, RandomSource};
use crate::ingest::{IngestStatus, Receiver};
use crate::wire::{WireIngestRequest, WireIngestResponse, INGEST_PATH};
use reqwest::blocking::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Response surfaced by a transport: the outcome code plus whatever
/// diagnostics the receiver attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestResponse {
    pub status: IngestStatus,
    pub message: Option<String>,
    pub correlation_id: Option<String>,
}

/// Failure below the outcome contract: the request may or may not have
/// reached the receiver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request deadline exceeded")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("unexpected status code {0}")]
    UnexpectedStatus(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("invalid transport configuration: {0}")]
    Config(String),
}

impl TransportError {
    /// Whether the sender should retry. Timeouts and connection failures are
    /// always worth another attempt; 429 and 5xx statuses are server-side
    /// transients; anything else is permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout | TransportError::Connection(_) => true,
            TransportError::UnexpectedStatus(code) => *code == 429 || (500..600).contains(code),
            TransportError::Malformed(_) | TransportError::Config(_) => false,
        }
    }
}

/// Delivery channel between sender and receiver. Implementations may lose the
/// request in either direction; callers observe that as [`TransportError`].
pub trait IngestTransport {
    fn send(&mut self, event: &TelemetryEvent) -> Result<IngestResponse, TransportError>;
}

/// Blocking HTTP transport posting wire requests to the receiver's
/// `/ingest` endpoint.
#[derive(Debug, Clone)]
pub struct HttpIngestTransport {
    client: Client,
    endpoint: String,
}

impl HttpIngestTransport {
    /// Creates a transport targeting the provided base endpoint (e.g.
    /// `http://edge.local:8000`) with a fixed request deadline.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(TransportError::Config(
                "ingest endpoint must not be empty".into(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::Config(format!("http client build failed: {err}")))?;
        Ok(Self { client, endpoint })
    }

    fn ingest_url(&self) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), INGEST_PATH)
    }
}

impl IngestTransport for HttpIngestTransport {
    fn send(&mut self, event: &TelemetryEvent) -> Result<IngestResponse, TransportError> {
        let wire_request = WireIngestRequest::from(event);
        let response = self
            .client
            .post(self.ingest_url())
            .json(&wire_request)
            .send()
            .map_err(|err| {
                if err.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Connection(err.to_string())
                }
            })?;
        let code = response.status().as_u16();
        let status = IngestStatus::from_status_code(code)
            .ok_or(TransportError::UnexpectedStatus(code))?;
        // Body is diagnostic only; classification keys off the status code.
        let body: Option<WireIngestResponse> = response.json().ok();
        Ok(IngestResponse {
            status,
            message: body.as_ref().map(|wire| wire.message.clone()),
            correlation_id: body.map(|wire| wire.correlation_id),
        })
    }
}

/// In-process transport calling a [`Receiver`] directly, used by the demo
/// harness and end-to-end tests.
#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    receiver: Arc<Receiver>,
}

impl LoopbackTransport {
    pub fn new(receiver: Arc<Receiver>) -> Self {
        Self { receiver }
    }
}

impl IngestTransport for LoopbackTransport {
    fn send(&mut self, event: &TelemetryEvent) -> Result<IngestResponse, TransportError> {
        let report = self.receiver.ingest(event);
        Ok(IngestResponse {
            status: report.status,
            message: Some(report.reason.to_string()),
            correlation_id: Some(report.correlation_id),
        })
    }
}

/// Decorator injecting synthetic transport faults around an inner transport.
///
/// Drop rolls keep the request off the wire entirely and surface the timeout
/// the sender would eventually observe. Duplicate rolls transmit the event
/// twice back-to-back and report the first result; the shadow send is a
/// transport artifact, independent of the retry loop's own duplicates.
pub struct FaultyTransport<T: IngestTransport> {
    inner: T,
    profile: FaultProfile,
    rng: Box<dyn RandomSource>,
    pause: Box<dyn FnMut(Duration)>,
}

impl<T: IngestTransport> FaultyTransport<T> {
    pub fn new(inner: T, profile: FaultProfile, rng: Box<dyn RandomSource>) -> Self {
        Self {
            inner,
            profile,
            rng,
            pause: Box::new(|delay| std::thread::sleep(delay)),
        }
    }

    /// Replaces the jitter pause hook so tests can record delays instead of
    /// sleeping.
    pub fn with_pause(mut self, pause: Box<dyn FnMut(Duration)>) -> Self {
        self.pause = pause;
        self
    }
}

impl<T: IngestTransport> IngestTransport for FaultyTransport<T> {
    fn send(&mut self, event: &TelemetryEvent) -> Result<IngestResponse, TransportError> {
        if self.profile.should_drop(self.rng.as_mut()) {
            return Err(TransportError::Timeout);
        }
        if let Some(delay) = self.profile.jitter_delay(self.rng.as_mut()) {
            (self.pause)(delay);
        }
        let first = self.inner.send(event);
        if self.profile.should_duplicate(self.rng.as_mut()) {
            let _ = self.inner.send(event);
        }
        first
    }
}
