//! Scenario configuration.
//!
//! A [`ScenarioConfig`] can be built in code with the `with_*` builders or
//! loaded from TOML. Every field has a default, so a TOML file only needs to
//! name what it changes:
//!
//! ```toml
//! duration = "2s"
//! run_id = "gaming-heavy"
//! protocol = "tcp"
//!
//! [[slices]]
//! traffic_class = "cloud-gaming"
//! devices = 6
//! center_frequency = 28e9
//! bandwidth = 400e6
//! numerology = 4
//! data_rate = "20mbps"
//! ```

use serde::Deserialize;
use slicesim_core::{BeamformingMethod, RadioConfig};
use slicesim_simulation::LinkConfig;
use slicesim_slicing::{AdmissionConfig, BearerPolicy, ClassQuota, SliceAdmission};
use slicesim_spectrum::{BandDefinition, SegmentDefinition};
use slicesim_traffic::{TrafficError, TrafficGeneratorConfig};
use slicesim_types::{DataRate, Protocol, TrafficClass};
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default packet size in bytes.
pub const DEFAULT_PACKET_SIZE: u32 = 1252;

/// Default packet rate per flow.
pub const DEFAULT_PACKETS_PER_SECOND: u32 = 1000;

/// Errors in a scenario configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Scenario defines no slices")]
    NoSlices,

    #[error("Simulation duration must be positive")]
    ZeroDuration,

    /// Start time, duration and drain do not fit on the simulation clock.
    #[error("Run end time overflows: start {start:?} + duration {duration:?} + drain {drain:?}")]
    TimelineOverflow {
        start: Duration,
        duration: Duration,
        drain: Duration,
    },

    /// The run id names the report file, so it must be a plain file name.
    #[error("Invalid run id {0:?}")]
    InvalidRunId(String),

    #[error("Slice {0} has no sub-flows")]
    ZeroSubFlows(TrafficClass),

    #[error("Invalid traffic for slice {class}")]
    Traffic {
        class: TrafficClass,
        #[source]
        source: TrafficError,
    },

    /// A per-slice list override has the wrong number of entries.
    #[error("{option} needs {expected} values, got {actual}")]
    ListLength {
        option: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Too many user equipments: {0}")]
    TooManyDevices(usize),
}

/// One slice: a traffic class, its device quota, its carrier segment and the
/// traffic every member receives.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SliceConfig {
    pub traffic_class: TrafficClass,

    /// Number of user equipments in the slice.
    pub devices: usize,

    /// Center frequency of the slice's carrier segment in Hz.
    pub center_frequency: f64,

    /// Bandwidth of the slice's carrier segment in Hz.
    pub bandwidth: f64,

    pub numerology: u8,

    #[serde(default = "default_packet_size")]
    pub packet_size: u32,

    #[serde(default = "default_data_rate")]
    pub data_rate: DataRate,

    /// Packets per flow before the generator goes quiet.
    #[serde(default = "default_packet_budget")]
    pub packet_budget: u32,

    /// Simultaneous downlink flows per device.
    #[serde(default = "default_sub_flows")]
    pub sub_flows: u16,

    /// First local port the slice's flows may use.
    #[serde(default = "default_base_port")]
    pub base_port: u16,
}

fn default_packet_size() -> u32 {
    DEFAULT_PACKET_SIZE
}

fn default_data_rate() -> DataRate {
    DataRate::from_packet_rate(DEFAULT_PACKET_SIZE, DEFAULT_PACKETS_PER_SECOND)
}

fn default_packet_budget() -> u32 {
    u32::MAX
}

fn default_sub_flows() -> u16 {
    1
}

fn default_base_port() -> u16 {
    1001
}

impl SliceConfig {
    /// Create a slice with the default traffic mix: one flow per device of
    /// 1252-byte packets at 1000 packets per second.
    pub fn new(
        traffic_class: TrafficClass,
        devices: usize,
        center_frequency: f64,
        bandwidth: f64,
        numerology: u8,
    ) -> Self {
        Self {
            traffic_class,
            devices,
            center_frequency,
            bandwidth,
            numerology,
            packet_size: default_packet_size(),
            data_rate: default_data_rate(),
            packet_budget: default_packet_budget(),
            sub_flows: default_sub_flows(),
            base_port: default_base_port(),
        }
    }

    pub fn with_packet_size(mut self, packet_size: u32) -> Self {
        self.packet_size = packet_size;
        self
    }

    pub fn with_data_rate(mut self, data_rate: DataRate) -> Self {
        self.data_rate = data_rate;
        self
    }

    pub fn with_packet_budget(mut self, packet_budget: u32) -> Self {
        self.packet_budget = packet_budget;
        self
    }

    pub fn with_sub_flows(mut self, sub_flows: u16) -> Self {
        self.sub_flows = sub_flows;
        self
    }

    pub fn with_base_port(mut self, base_port: u16) -> Self {
        self.base_port = base_port;
        self
    }

    pub fn segment_definition(&self) -> SegmentDefinition {
        SegmentDefinition {
            center_frequency: self.center_frequency,
            bandwidth: self.bandwidth,
            numerology: self.numerology,
        }
    }

    pub fn quota(&self) -> ClassQuota {
        ClassQuota::new(self.traffic_class, self.devices)
    }

    pub fn admission(&self) -> SliceAdmission {
        SliceAdmission {
            base_port: self.base_port,
            sub_flows: self.sub_flows,
        }
    }

    /// Generator configuration for one flow of this slice.
    pub fn generator_config(
        &self,
        destination: SocketAddrV4,
        protocol: Protocol,
    ) -> TrafficGeneratorConfig {
        TrafficGeneratorConfig::new(destination, self.packet_size, self.data_rate)
            .with_packet_budget(self.packet_budget)
            .with_protocol(protocol)
    }
}

/// Configuration of a whole run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Length of the application window.
    #[serde(deserialize_with = "duration_format::deserialize")]
    pub duration: Duration,

    /// When generators start.
    #[serde(deserialize_with = "duration_format::deserialize")]
    pub app_start_time: Duration,

    /// Extra run time after generators stop, so in-flight packets land.
    #[serde(deserialize_with = "duration_format::deserialize")]
    pub drain: Duration,

    pub band: BandDefinition,

    /// Slices in segment order: slice `i` is bound to segment `i`.
    pub slices: Vec<SliceConfig>,

    /// Total transmit power shared between segments, in dBm.
    pub total_tx_power_dbm: f64,

    /// Settings forwarded verbatim to the radio engine.
    pub radio: RadioConfig,

    pub protocol: Protocol,

    pub bearer_policy: BearerPolicy,

    /// Fixed delay between the remote host and the radio.
    #[serde(deserialize_with = "duration_format::deserialize")]
    pub link_delay: Duration,

    /// Upper bound of the per-packet jitter.
    #[serde(deserialize_with = "duration_format::deserialize")]
    pub max_jitter: Duration,

    /// Verbose logging.
    pub logging: bool,

    /// Names the report file.
    pub run_id: String,

    pub output_dir: PathBuf,

    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let link = LinkConfig::default();
        Self {
            duration: Duration::from_secs(1),
            app_start_time: Duration::from_millis(100),
            drain: Duration::from_secs(2),
            band: BandDefinition {
                center_frequency: 28e9,
                bandwidth: 3e9,
            },
            slices: vec![
                SliceConfig::new(TrafficClass::InteractiveVideo, 2, 27e9, 400e6, 3)
                    .with_base_port(1001),
                SliceConfig::new(TrafficClass::CloudGaming, 3, 28e9, 300e6, 4)
                    .with_base_port(1101),
                SliceConfig::new(TrafficClass::VehicularControl, 4, 29e9, 300e6, 3)
                    .with_base_port(1201),
            ],
            total_tx_power_dbm: 8.0,
            radio: RadioConfig::default(),
            protocol: Protocol::Udp,
            bearer_policy: BearerPolicy::default(),
            link_delay: link.link_delay,
            max_jitter: link.max_jitter,
            logging: false,
            run_id: "slicing-run".to_string(),
            output_dir: PathBuf::from("./"),
            seed: 1,
        }
    }
}

impl ScenarioConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_app_start_time(mut self, app_start_time: Duration) -> Self {
        self.app_start_time = app_start_time;
        self
    }

    pub fn with_drain(mut self, drain: Duration) -> Self {
        self.drain = drain;
        self
    }

    pub fn with_band(mut self, band: BandDefinition) -> Self {
        self.band = band;
        self
    }

    pub fn with_slices(mut self, slices: Vec<SliceConfig>) -> Self {
        self.slices = slices;
        self
    }

    pub fn with_total_tx_power(mut self, total_tx_power_dbm: f64) -> Self {
        self.total_tx_power_dbm = total_tx_power_dbm;
        self
    }

    pub fn with_tdd_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.radio.tdd_pattern = pattern.into();
        self
    }

    pub fn with_beamforming(mut self, beamforming: BeamformingMethod) -> Self {
        self.radio.beamforming = beamforming;
        self
    }

    pub fn with_full_buffer(mut self, full_buffer: bool) -> Self {
        self.radio.full_buffer = full_buffer;
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_bearer_policy(mut self, bearer_policy: BearerPolicy) -> Self {
        self.bearer_policy = bearer_policy;
        self
    }

    pub fn with_link(mut self, link: LinkConfig) -> Self {
        self.link_delay = link.link_delay;
        self.max_jitter = link.max_jitter;
        self
    }

    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Per-slice list overrides
    // ═══════════════════════════════════════════════════════════════════════

    /// Set every slice's device count, in slice order.
    pub fn with_device_counts(self, counts: &[usize]) -> Result<Self, ConfigError> {
        self.override_slices("devices", counts, |slice, n| slice.devices = *n)
    }

    pub fn with_segment_center_frequencies(self, centers: &[f64]) -> Result<Self, ConfigError> {
        self.override_slices("segment center frequencies", centers, |slice, f| {
            slice.center_frequency = *f
        })
    }

    pub fn with_segment_bandwidths(self, bandwidths: &[f64]) -> Result<Self, ConfigError> {
        self.override_slices("segment bandwidths", bandwidths, |slice, bw| {
            slice.bandwidth = *bw
        })
    }

    pub fn with_numerologies(self, numerologies: &[u8]) -> Result<Self, ConfigError> {
        self.override_slices("numerologies", numerologies, |slice, n| {
            slice.numerology = *n
        })
    }

    fn override_slices<T>(
        mut self,
        option: &'static str,
        values: &[T],
        apply: impl Fn(&mut SliceConfig, &T),
    ) -> Result<Self, ConfigError> {
        if values.len() != self.slices.len() {
            return Err(ConfigError::ListLength {
                option,
                expected: self.slices.len(),
                actual: values.len(),
            });
        }
        for (slice, value) in self.slices.iter_mut().zip(values) {
            apply(slice, value);
        }
        Ok(self)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Derived values
    // ═══════════════════════════════════════════════════════════════════════

    /// Check what can be checked without building the scenario.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slices.is_empty() {
            return Err(ConfigError::NoSlices);
        }
        if self.duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }
        let end = self
            .app_start_time
            .checked_add(self.duration)
            .and_then(|stop| stop.checked_add(self.drain));
        if end.is_none() {
            return Err(ConfigError::TimelineOverflow {
                start: self.app_start_time,
                duration: self.duration,
                drain: self.drain,
            });
        }
        let run_id_ok = !self.run_id.is_empty()
            && self.run_id != "."
            && self.run_id != ".."
            && !self.run_id.contains(['/', '\\']);
        if !run_id_ok {
            return Err(ConfigError::InvalidRunId(self.run_id.clone()));
        }

        for slice in &self.slices {
            if slice.sub_flows == 0 && slice.devices > 0 {
                return Err(ConfigError::ZeroSubFlows(slice.traffic_class));
            }
            let probe = slice.generator_config(
                SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, slice.base_port),
                self.protocol,
            );
            probe.validate().map_err(|source| ConfigError::Traffic {
                class: slice.traffic_class,
                source,
            })?;
        }
        Ok(())
    }

    /// Length of the application window, used for offered load.
    pub fn active_duration(&self) -> Duration {
        self.duration
    }

    /// When generators are stopped. Saturates on a timeline that
    /// [`validate`](Self::validate) would reject.
    pub fn app_stop_time(&self) -> Duration {
        self.app_start_time.saturating_add(self.duration)
    }

    /// When the run ends.
    pub fn end_time(&self) -> Duration {
        self.app_stop_time().saturating_add(self.drain)
    }

    /// Where the report is written.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.run_id)
    }

    pub fn total_devices(&self) -> usize {
        self.slices.iter().map(|slice| slice.devices).sum()
    }

    pub fn segment_definitions(&self) -> Vec<SegmentDefinition> {
        self.slices.iter().map(SliceConfig::segment_definition).collect()
    }

    pub fn class_quotas(&self) -> Vec<ClassQuota> {
        self.slices.iter().map(SliceConfig::quota).collect()
    }

    pub fn admission_config(&self) -> AdmissionConfig {
        AdmissionConfig {
            protocol: self.protocol,
            bearer_policy: self.bearer_policy,
        }
    }

    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            link_delay: self.link_delay,
            max_jitter: self.max_jitter,
        }
    }
}

mod duration_format {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    /// Parse durations such as `"100ms"` or `"2s"`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
