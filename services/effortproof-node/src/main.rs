use anyhow::{anyhow, bail, Context};
use effortproof_core::{logging, Config, SessionConfig, TelemetryPoint};
use effortproof_crypto::{CircuitType, ProofOrchestrator};
use effortproof_stream::{FileArchive, SessionReport, TelemetrySession};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const NODE_PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct NodeVersionHandshake {
    version: &'static str,
    protocol_version: u32,
    circuits: Vec<CircuitSummary>,
}

#[derive(Debug, Serialize)]
struct CircuitSummary {
    circuit: CircuitType,
    public_inputs: usize,
}

#[derive(Debug)]
struct NodeArgs {
    config: Option<PathBuf>,
    telemetry: PathBuf,
    class_id: String,
    rider_id: String,
    threshold: u32,
    min_duration: u32,
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--version-json") {
        let handshake = NodeVersionHandshake {
            version: env!("CARGO_PKG_VERSION"),
            protocol_version: NODE_PROTOCOL_VERSION,
            circuits: [CircuitType::EffortThreshold, CircuitType::CompositeEffort]
                .into_iter()
                .map(|circuit| CircuitSummary {
                    circuit,
                    public_inputs: circuit.public_input_count(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string(&handshake)?);
        return Ok(());
    }

    let args = parse_args(&args)?;

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default_config(),
    };
    config.apply_env_overrides()?;
    if args.json_logs {
        config.logging.json = true;
    }
    logging::init_from_config(&config.logging);

    let orchestrator = Arc::new(ProofOrchestrator::simulated_only(&config));
    orchestrator.ready().await;
    let backend = orchestrator.backend_info().await;
    info!(backend = %backend.kind, forced = backend.forced, "Proof backend selected");

    let mut session = TelemetrySession::new(Arc::clone(&orchestrator), config.session.clone());
    if let Some(dir) = &config.archive.directory {
        session = session.with_archive(Arc::new(FileArchive::new(dir)));
    }

    session.start_session(SessionConfig::new(
        args.class_id.clone(),
        args.rider_id.clone(),
        args.threshold,
        args.min_duration,
    ));

    let file = tokio::fs::File::open(&args.telemetry)
        .await
        .with_context(|| format!("opening telemetry {}", args.telemetry.display()))?;
    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TelemetryPoint>(&line) {
            Ok(point) => {
                session.add_telemetry(point);
            }
            Err(e) => warn!(line = line_no, error = %e, "Skipping malformed telemetry line"),
        }
    }

    let report = SessionReport::from(session.end_session().await);
    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_args(args: &[String]) -> anyhow::Result<NodeArgs> {
    let mut config = None;
    let mut telemetry = None;
    let mut class_id = None;
    let mut rider_id = None;
    let mut threshold = None;
    let mut min_duration = None;
    let mut json_logs = false;

    let mut args_iter = args.iter();
    while let Some(arg) = args_iter.next() {
        let mut value = || {
            args_iter
                .next()
                .cloned()
                .ok_or_else(|| anyhow!("{arg} was provided without a value"))
        };
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(value()?)),
            "--telemetry" => telemetry = Some(PathBuf::from(value()?)),
            "--class" => class_id = Some(value()?),
            "--rider" => rider_id = Some(value()?),
            "--threshold" => threshold = Some(parse_number("--threshold", &value()?)?),
            "--min-duration" => min_duration = Some(parse_number("--min-duration", &value()?)?),
            "--json-logs" => json_logs = true,
            other => bail!("unknown argument {other}"),
        }
    }

    Ok(NodeArgs {
        config,
        telemetry: telemetry.ok_or_else(|| anyhow!("missing required --telemetry <path>"))?,
        class_id: class_id.ok_or_else(|| anyhow!("missing required --class <id>"))?,
        rider_id: rider_id.unwrap_or_else(|| "anonymous".to_string()),
        threshold: threshold.ok_or_else(|| anyhow!("missing required --threshold <bpm>"))?,
        min_duration: min_duration
            .ok_or_else(|| anyhow!("missing required --min-duration <minutes>"))?,
        json_logs,
    })
}

fn parse_number(flag: &str, raw: &str) -> anyhow::Result<u32> {
    raw.parse()
        .map_err(|_| anyhow!("{flag} expects a non-negative integer, got {raw}"))
}
