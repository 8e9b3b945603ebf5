use crate::config::ServiceConfig;
use crate::device::{DeviceLoop, TelemetryGenerator};
use crate::faults::EntropyRandom;
use crate::ingest::Receiver;
use crate::observability::ObservabilityService;
use crate::retry::{IngestClient, ShutdownToken};
use crate::transport::{FaultyTransport, LoopbackTransport};
use anyhow::Result;
use std::env;
use std::sync::Arc;

/// Runtime options derived from CLI flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Stop after producing this many events; `None` runs until interrupted.
    pub max_events: Option<u64>,
    pub config_path: Option<String>,
    pub source_id: Option<String>,
}

impl RuntimeOptions {
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut max_events = None;
        let mut config_path = None;
        let mut source_id = None;
        let mut args_iter = args.into_iter();
        args_iter.next(); // skip binary name
        for arg in args_iter {
            if let Some(value) = arg.strip_prefix("--events=") {
                max_events = value.parse().ok();
            } else if let Some(value) = arg.strip_prefix("--config=") {
                config_path = Some(value.to_string());
            } else if let Some(value) = arg.strip_prefix("--source=") {
                source_id = Some(value.to_string());
            }
        }
        Self {
            max_events,
            config_path,
            source_id,
        }
    }

    pub fn from_env() -> Self {
        Self::from_args(env::args())
    }
}

/// Application entrypoint: runs the device loop against an in-process
/// receiver through the fault-injecting loopback transport and prints the
/// final counters.
pub fn run() -> Result<()> {
    let options = RuntimeOptions::from_env();
    let mut config = match &options.config_path {
        Some(path) => ServiceConfig::load_from_file(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(source_id) = options.source_id {
        config.device.source_id = source_id;
        config.validate()?;
    }

    let receiver = Arc::new(Receiver::new(config.receiver));
    let transport = FaultyTransport::new(
        LoopbackTransport::new(receiver.clone()),
        config.device.faults,
        Box::new(EntropyRandom::new()),
    );
    let client = IngestClient::new(transport, config.device.retry);
    let generator = TelemetryGenerator::new(
        config.device.source_id.clone(),
        config.device.sequence_floor,
        Box::new(EntropyRandom::new()),
    );
    let shutdown = ShutdownToken::new();
    let mut device = DeviceLoop::new(generator, client, config.device.interval(), shutdown);

    let stats = device.run(options.max_events)?;
    println!("device: {stats:?}");

    let observability = ObservabilityService::new("edgeline");
    let envelope = observability.metrics_envelope(receiver.metrics().snapshot());
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    print!("{}", envelope.render_prometheus());
    print!("{}", device.client().telemetry().render_metrics());
    Ok(())
}
