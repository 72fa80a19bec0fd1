//! Slicing scenario CLI.
//!
//! Runs one scenario and writes its flow report to `<output-dir>/<run-id>`.

use anyhow::{Context, Result};
use clap::Parser;
use slicesim_core::BeamformingMethod;
use slicesim_simulator::{Scenario, ScenarioConfig, ScenarioError};
use slicesim_slicing::BearerPolicy;
use slicesim_stats::StatsError;
use slicesim_types::Protocol;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "slicesim")]
#[command(about = "Spectrum slicing scenario simulator")]
#[command(version)]
struct Cli {
    /// TOML scenario file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Length of the application window (e.g. "1s", "500ms")
    #[arg(long)]
    sim_time: Option<humantime::Duration>,

    /// When generators start
    #[arg(long)]
    app_start_time: Option<humantime::Duration>,

    /// Devices per slice, comma-separated in slice order
    #[arg(long, value_delimiter = ',')]
    devices: Option<Vec<usize>>,

    /// Center frequency of the operation band in Hz
    #[arg(long)]
    central_frequency_band: Option<f64>,

    /// Bandwidth of the operation band in Hz
    #[arg(long)]
    bandwidth_band: Option<f64>,

    /// Segment center frequencies in Hz, comma-separated in slice order
    #[arg(long, value_delimiter = ',')]
    central_frequencies: Option<Vec<f64>>,

    /// Segment bandwidths in Hz, comma-separated in slice order
    #[arg(long, value_delimiter = ',')]
    bandwidths: Option<Vec<f64>>,

    /// Segment numerologies, comma-separated in slice order
    #[arg(long, value_delimiter = ',')]
    numerologies: Option<Vec<u8>>,

    /// Total transmit power in dBm, shared between segments by bandwidth
    #[arg(long)]
    total_tx_power: Option<f64>,

    /// TDD pattern forwarded to the engine (e.g. "DL|S|UL|UL|UL|DL|S|UL|UL|UL|")
    #[arg(long)]
    tdd_pattern: Option<String>,

    /// Use beam search instead of direct-path beamforming
    #[arg(long)]
    cell_scan: bool,

    /// Beam search angle step in degrees
    #[arg(long, default_value_t = 10.0)]
    beam_search_angle_step: f64,

    /// Saturate every bearer
    #[arg(long)]
    full_buffer: bool,

    /// Transport protocol of every flow (udp, tcp)
    #[arg(long)]
    protocol: Option<Protocol>,

    /// Bearer policy for multi-flow devices (shared, per-flow)
    #[arg(long, value_parser = parse_bearer_policy)]
    bearer_policy: Option<BearerPolicy>,

    /// Enable logging
    #[arg(long)]
    logging: bool,

    /// Run identifier; names the report file
    #[arg(long)]
    run_id: Option<String>,

    /// Directory where the report is written
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_bearer_policy(s: &str) -> Result<BearerPolicy, String> {
    match s.to_lowercase().as_str() {
        "shared" => Ok(BearerPolicy::Shared),
        "per-flow" | "perflow" => Ok(BearerPolicy::PerFlow),
        _ => Err(format!("Unknown bearer policy: {}", s)),
    }
}

impl Cli {
    /// Start from the config file (or defaults) and apply every flag given.
    fn scenario_config(&self) -> Result<ScenarioConfig> {
        let mut config = match &self.config {
            Some(path) => ScenarioConfig::load(path)
                .with_context(|| format!("loading scenario {}", path.display()))?,
            None => ScenarioConfig::default(),
        };

        if let Some(duration) = &self.sim_time {
            config = config.with_duration(**duration);
        }
        if let Some(start) = &self.app_start_time {
            config = config.with_app_start_time(**start);
        }
        if let Some(devices) = &self.devices {
            config = config.with_device_counts(devices)?;
        }
        if let Some(center) = self.central_frequency_band {
            config.band.center_frequency = center;
        }
        if let Some(bandwidth) = self.bandwidth_band {
            config.band.bandwidth = bandwidth;
        }
        if let Some(centers) = &self.central_frequencies {
            config = config.with_segment_center_frequencies(centers)?;
        }
        if let Some(bandwidths) = &self.bandwidths {
            config = config.with_segment_bandwidths(bandwidths)?;
        }
        if let Some(numerologies) = &self.numerologies {
            config = config.with_numerologies(numerologies)?;
        }
        if let Some(power) = self.total_tx_power {
            config = config.with_total_tx_power(power);
        }
        if let Some(pattern) = &self.tdd_pattern {
            config = config.with_tdd_pattern(pattern.clone());
        }
        if self.cell_scan {
            config = config.with_beamforming(BeamformingMethod::CellScan {
                angle_step: self.beam_search_angle_step,
            });
        }
        if self.full_buffer {
            config = config.with_full_buffer(true);
        }
        if let Some(protocol) = self.protocol {
            config = config.with_protocol(protocol);
        }
        if let Some(policy) = self.bearer_policy {
            config = config.with_bearer_policy(policy);
        }
        if self.logging {
            config = config.with_logging(true);
        }
        if let Some(run_id) = &self.run_id {
            config = config.with_run_id(run_id.clone());
        }
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir.clone());
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        Ok(config)
    }
}

fn init_tracing(logging: bool) {
    let default_directive = if logging { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.scenario_config()?;
    init_tracing(config.logging);

    let started = Instant::now();
    let outcome = Scenario::new(config)?.run()?;

    print!("{}", outcome.report);
    info!(
        runtime_secs = started.elapsed().as_secs_f64(),
        report = %outcome.report_path.display(),
        "RUNTIME"
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ScenarioError>() {
                Some(ScenarioError::Stats(open @ StatsError::OpenReport { .. })) => {
                    eprintln!("{}", open);
                }
                _ => eprintln!("Error: {:#}", err),
            }
            ExitCode::from(1)
        }
    }
}
