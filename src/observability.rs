use crate::metrics::MetricsSnapshot;
use crate::wire::{HEALTHZ_PATH, INGEST_PATH, METRICS_PATH};
use serde::Serialize;

/// Endpoint wiring descriptor.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    path: String,
    registry: String,
}

impl EndpointConfig {
    fn new(path: impl Into<String>, registry: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            registry: registry.into(),
        }
    }

    /// Endpoint path (e.g., `/metrics`).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Registry backing the endpoint.
    pub fn registry(&self) -> &str {
        &self.registry
    }
}

/// Shared-service wiring for the receiver's `/ingest`, `/metrics`, and
/// `/healthz` surfaces.
#[derive(Debug)]
pub struct ObservabilityService {
    ingest: EndpointConfig,
    metrics: EndpointConfig,
    healthz: EndpointConfig,
}

impl ObservabilityService {
    /// Creates the service bound to the provided registry name.
    pub fn new(registry: impl Into<String>) -> Self {
        let registry = registry.into();
        Self {
            ingest: EndpointConfig::new(INGEST_PATH, registry.clone()),
            metrics: EndpointConfig::new(METRICS_PATH, registry.clone()),
            healthz: EndpointConfig::new(HEALTHZ_PATH, registry),
        }
    }

    pub fn registry(&self) -> &str {
        self.metrics.registry()
    }

    pub fn ingest_endpoint(&self) -> &EndpointConfig {
        &self.ingest
    }

    pub fn metrics_endpoint(&self) -> &EndpointConfig {
        &self.metrics
    }

    pub fn healthz_endpoint(&self) -> &EndpointConfig {
        &self.healthz
    }

    /// Liveness status served at `/healthz`. Deliberately independent of the
    /// dedup cache and of any sender retry state.
    pub fn healthz_status(&self, now_ms: u64) -> HealthzStatus {
        HealthzStatus {
            healthy: true,
            timestamp_ms: now_ms,
            registry: self.healthz.registry().to_string(),
        }
    }

    /// Wraps a counter snapshot into the published `/metrics` envelope.
    pub fn metrics_envelope(&self, snapshot: MetricsSnapshot) -> MetricsEnvelope {
        MetricsEnvelope {
            registry: self.metrics.registry().to_string(),
            counters: snapshot,
        }
    }
}

/// Payload of the liveness probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthzStatus {
    pub healthy: bool,
    pub timestamp_ms: u64,
    pub registry: String,
}

/// Published metrics payload.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsEnvelope {
    pub registry: String,
    pub counters: MetricsSnapshot,
}

impl MetricsEnvelope {
    /// Renders the envelope as Prometheus exposition text.
    pub fn render_prometheus(&self) -> String {
        self.counters.render_prometheus()
    }
}
