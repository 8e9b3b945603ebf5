use edgeline::{
    IngestReport, IngestStatus, TelemetryEvent, WireIngestRequest, WireIngestResponse,
};

#[test]
fn status_codes_cover_the_outcome_contract() {
    assert_eq!(IngestStatus::Accepted.status_code(), 200);
    assert_eq!(IngestStatus::Duplicate.status_code(), 409);
    assert_eq!(IngestStatus::Overloaded.status_code(), 503);
    assert_eq!(IngestStatus::Invalid.status_code(), 400);
    for status in [
        IngestStatus::Accepted,
        IngestStatus::Duplicate,
        IngestStatus::Overloaded,
        IngestStatus::Invalid,
    ] {
        assert_eq!(IngestStatus::from_status_code(status.status_code()), Some(status));
    }
    assert_eq!(IngestStatus::from_status_code(504), None);
    assert_eq!(IngestStatus::from_status_code(429), None);
}

#[test]
fn terminality_follows_the_classification_table() {
    assert!(IngestStatus::Accepted.is_terminal());
    assert!(IngestStatus::Duplicate.is_terminal());
    assert!(IngestStatus::Invalid.is_terminal());
    assert!(!IngestStatus::Overloaded.is_terminal());
}

#[test]
fn request_survives_the_wire_with_arbitrary_payload_bytes() {
    let event = TelemetryEvent {
        source_id: "device-001".into(),
        sequence_id: 42,
        timestamp_ms: 1_700_000_000_000,
        payload: vec![0x00, 0xff, 0x7f, 0x80, b'{'],
    };
    let wire = WireIngestRequest::from(&event);
    let json = serde_json::to_string(&wire).unwrap();
    assert!(json.contains("payload_b64"));
    let decoded: WireIngestRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded.into_event().unwrap(), event);
}

#[test]
fn corrupt_payload_base64_is_a_decode_error() {
    let wire = WireIngestRequest {
        source_id: "device-001".into(),
        sequence_id: 1,
        timestamp_ms: 0,
        payload_b64: "not base64!!".into(),
    };
    assert!(wire.into_event().is_err());
}

#[test]
fn response_body_mirrors_the_ingest_report() {
    let report = IngestReport {
        status: IngestStatus::Duplicate,
        reason: "already_processed",
        correlation_id: "c-0000002a".into(),
    };
    let wire = WireIngestResponse::from(&report);
    assert_eq!(wire.status, "duplicate");
    assert_eq!(wire.message, "already_processed");
    assert_eq!(wire.correlation_id, "c-0000002a");
    let json = serde_json::to_string(&wire).unwrap();
    let parsed: WireIngestResponse = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, wire);
}
