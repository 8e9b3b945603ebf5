use edgeline::{IngestMetrics, ObservabilityService};
use std::sync::Arc;
use std::thread;

#[test]
fn counters_are_monotonic_and_independent() {
    let metrics = IngestMetrics::new();
    metrics.incr_received();
    metrics.incr_received();
    metrics.incr_accepted();
    metrics.incr_duplicates();
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.received_total, 2);
    assert_eq!(snapshot.accepted_total, 1);
    assert_eq!(snapshot.duplicates_total, 1);
    assert_eq!(snapshot.rejected_total, 0);
    assert_eq!(snapshot.transient_total, 0);
}

#[test]
fn concurrent_increments_never_undercount() {
    let metrics = Arc::new(IngestMetrics::new());
    let mut handles = Vec::new();
    for _ in 0..8 {
        let metrics = metrics.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..1_000 {
                metrics.incr_received();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(metrics.snapshot().received_total, 8_000);
}

#[test]
fn prometheus_rendering_lists_all_counters() {
    let metrics = IngestMetrics::new();
    metrics.incr_received();
    metrics.incr_transient();
    let rendered = metrics.snapshot().render_prometheus();
    assert!(rendered.contains("edgeline_received_total 1"));
    assert!(rendered.contains("edgeline_accepted_total 0"));
    assert!(rendered.contains("edgeline_duplicates_total 0"));
    assert!(rendered.contains("edgeline_rejected_total 0"));
    assert!(rendered.contains("edgeline_transient_total 1"));
}

#[test]
fn observability_endpoints_share_one_registry() {
    let service = ObservabilityService::new("edgeline");
    assert_eq!(service.ingest_endpoint().path(), "/ingest");
    assert_eq!(service.metrics_endpoint().path(), "/metrics");
    assert_eq!(service.healthz_endpoint().path(), "/healthz");
    assert_eq!(service.metrics_endpoint().registry(), "edgeline");
}

#[test]
fn healthz_is_independent_of_ingest_state() {
    let service = ObservabilityService::new("edgeline");
    let status = service.healthz_status(1_700_000_000_000);
    assert!(status.healthy);
    assert_eq!(status.timestamp_ms, 1_700_000_000_000);
    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"healthy\":true"));
}

#[test]
fn metrics_envelope_wraps_the_snapshot() {
    let metrics = IngestMetrics::new();
    metrics.incr_received();
    metrics.incr_accepted();
    let service = ObservabilityService::new("edgeline");
    let envelope = service.metrics_envelope(metrics.snapshot());
    assert_eq!(envelope.counters.accepted_total, 1);
    assert!(envelope
        .render_prometheus()
        .contains("edgeline_accepted_total 1"));
}
