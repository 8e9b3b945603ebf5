use crate::event::TelemetryEvent;
use crate::ingest::{IngestReport, IngestStatus};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP path served by the receiver's ingestion endpoint.
pub const INGEST_PATH: &str = "/ingest";
/// Metrics snapshot endpoint.
pub const METRICS_PATH: &str = "/metrics";
/// Liveness probe endpoint.
pub const HEALTHZ_PATH: &str = "/healthz";

impl IngestStatus {
    /// Transport status code carrying this outcome.
    pub fn status_code(self) -> u16 {
        match self {
            IngestStatus::Accepted => 200,
            IngestStatus::Duplicate => 409,
            IngestStatus::Overloaded => 503,
            IngestStatus::Invalid => 400,
        }
    }

    /// Inverse of [`IngestStatus::status_code`]; `None` for codes outside the
    /// ingest contract.
    pub fn from_status_code(code: u16) -> Option<Self> {
        match code {
            200 => Some(IngestStatus::Accepted),
            409 => Some(IngestStatus::Duplicate),
            503 => Some(IngestStatus::Overloaded),
            400 => Some(IngestStatus::Invalid),
            _ => None,
        }
    }
}

/// Ingest request as serialized on the wire. The payload crosses as base64 so
/// arbitrary bytes survive the JSON envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireIngestRequest {
    pub source_id: String,
    pub sequence_id: i64,
    pub timestamp_ms: u64,
    pub payload_b64: String,
}

impl From<&TelemetryEvent> for WireIngestRequest {
    fn from(event: &TelemetryEvent) -> Self {
        Self {
            source_id: event.source_id.clone(),
            sequence_id: event.sequence_id,
            timestamp_ms: event.timestamp_ms,
            payload_b64: general_purpose::STANDARD.encode(&event.payload),
        }
    }
}

impl WireIngestRequest {
    /// Decodes the wire form back into a telemetry event.
    pub fn into_event(self) -> Result<TelemetryEvent, WireError> {
        let payload = general_purpose::STANDARD
            .decode(&self.payload_b64)
            .map_err(|source| WireError::PayloadDecode { source })?;
        Ok(TelemetryEvent {
            source_id: self.source_id,
            sequence_id: self.sequence_id,
            timestamp_ms: self.timestamp_ms,
            payload,
        })
    }
}

/// Diagnostic response body accompanying the status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireIngestResponse {
    pub status: String,
    pub message: String,
    pub correlation_id: String,
}

impl From<&IngestReport> for WireIngestResponse {
    fn from(report: &IngestReport) -> Self {
        Self {
            status: report.status.as_str().to_string(),
            message: report.reason.to_string(),
            correlation_id: report.correlation_id.clone(),
        }
    }
}

/// Errors decoding wire payloads.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("failed to decode base64 payload: {source}")]
    PayloadDecode { source: base64::DecodeError },
}
