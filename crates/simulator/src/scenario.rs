//! The setup pipeline and the run.

use crate::{ConfigError, ScenarioConfig, Topology};
use slicesim_core::{EngineError, RadioEngine};
use slicesim_simulation::{SimulatedEngine, SimulationRunner, SimulationStats};
use slicesim_slicing::{FlowAdmissionController, SliceBinding, SlicingError};
use slicesim_spectrum::{SpectrumError, SpectrumPlan};
use slicesim_stats::{FlowStatsAggregator, Report, ReportWriter, StatsError};
use slicesim_traffic::{TrafficError, TrafficGenerator};
use slicesim_types::{AdmissionRequest, DeviceId};
use std::net::SocketAddrV4;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that abort a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Spectrum(#[from] SpectrumError),

    #[error(transparent)]
    Slicing(#[from] SlicingError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Traffic(#[from] TrafficError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    /// An admitted flow targets a device the topology does not know.
    #[error("Admitted flow targets unknown device {0}")]
    UnknownDevice(DeviceId),

    #[error("Remote host ran out of source ports after {0} flows")]
    SourcePortsExhausted(usize),
}

/// What a finished run leaves behind.
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub report: Report,
    pub report_path: PathBuf,
    /// Admission requests in issue order.
    pub requests: Vec<AdmissionRequest>,
    pub stats: SimulationStats,
}

/// A validated scenario, ready to run.
pub struct Scenario {
    config: ScenarioConfig,
}

impl Scenario {
    pub fn new(config: ScenarioConfig) -> Result<Self, ScenarioError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Configure the engine, run the event loop and write the report.
    ///
    /// The report file is opened before the event loop starts; if that
    /// fails nothing is simulated or aggregated.
    pub fn run(&self) -> Result<ScenarioOutcome, ScenarioError> {
        let config = &self.config;

        let plan = SpectrumPlan::build(
            &config.band,
            &config.segment_definitions(),
            config.total_tx_power_dbm,
        );
        plan.validate()?;

        let topology = Topology::builder()
            .with_user_equipment(config.total_devices())
            .build()?;

        let mut engine = SimulatedEngine::new(config.link_config(), config.seed)
            .with_devices(topology.devices());
        engine.configure_spectrum(&plan, &config.radio)?;

        let binding =
            SliceBinding::bind(&config.class_quotas(), &plan, topology.user_equipment())?;
        binding.install_routes(&mut engine)?;

        let mut controller = FlowAdmissionController::new(config.admission_config());
        let mut requests = Vec::new();
        for (slice, slice_config) in binding.slices().iter().zip(&config.slices) {
            let admitted = controller.admit_slice(&mut engine, slice, slice_config.admission())?;
            requests.extend(admitted);
        }
        info!(
            slices = binding.slices().len(),
            flows = requests.len(),
            "Admission complete"
        );

        let writer = ReportWriter::create(config.report_path())?;

        let mut runner = SimulationRunner::new(engine);
        for (index, request) in requests.iter().enumerate() {
            let device = topology
                .device(request.device)
                .ok_or(ScenarioError::UnknownDevice(request.device))?;
            let slice_config = binding
                .slice(request.filter.slice)
                .and_then(|slice| config.slices.get(slice.id().0 as usize))
                .ok_or(SlicingError::UnknownSlice(request.filter.slice))?;

            let destination = SocketAddrV4::new(device.address, request.filter.local_port_start);
            let source = topology
                .source_endpoint(index)
                .ok_or(ScenarioError::SourcePortsExhausted(index))?;
            let generator =
                TrafficGenerator::new(slice_config.generator_config(destination, config.protocol))?;

            let app = runner.add_application(generator, source);
            runner.schedule_start(app, config.app_start_time);
            runner.schedule_stop(app, config.app_stop_time());
            debug!(app = %app, %source, %destination, "Scheduled flow");
        }

        runner.run_until(config.end_time());

        let report = FlowStatsAggregator::new(config.active_duration())
            .aggregate(runner.monitor().records());
        let report_path = writer.write(&report)?;

        Ok(ScenarioOutcome {
            report,
            report_path,
            requests,
            stats: *runner.stats(),
        })
    }
}
