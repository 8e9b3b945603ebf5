use edgeline::RuntimeOptions;

fn args(list: &[&str]) -> Vec<String> {
    std::iter::once("edgeline")
        .chain(list.iter().copied())
        .map(str::to_string)
        .collect()
}

#[test]
fn defaults_to_an_unbounded_run() {
    let options = RuntimeOptions::from_args(args(&[]));
    assert_eq!(options.max_events, None);
    assert_eq!(options.config_path, None);
    assert_eq!(options.source_id, None);
}

#[test]
fn parses_flags() {
    let options = RuntimeOptions::from_args(args(&[
        "--events=250",
        "--config=/etc/edgeline.json",
        "--source=device-007",
    ]));
    assert_eq!(options.max_events, Some(250));
    assert_eq!(options.config_path.as_deref(), Some("/etc/edgeline.json"));
    assert_eq!(options.source_id.as_deref(), Some("device-007"));
}

#[test]
fn malformed_event_budget_is_ignored() {
    let options = RuntimeOptions::from_args(args(&["--events=lots"]));
    assert_eq!(options.max_events, None);
}
