//! The seam to the external radio engine.

use serde::{Deserialize, Serialize};
use slicesim_spectrum::SpectrumPlan;
use slicesim_types::{AdmissionRequest, DeviceId, QosClass, SegmentId};
use thiserror::Error;

/// Beamforming method requested from the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BeamformingMethod {
    /// Steer directly along the line of sight.
    #[default]
    DirectPath,
    /// Exhaustive beam search with the given angle step in degrees.
    CellScan { angle_step: f64 },
}

/// Radio settings forwarded to the engine without interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioConfig {
    /// TDD slot pattern, e.g. `"DL|DL|DL|DL|UL|DL|DL|DL|DL|UL|"`.
    pub tdd_pattern: String,
    /// Beamforming method.
    pub beamforming: BeamformingMethod,
    /// Whether the engine should saturate every bearer.
    pub full_buffer: bool,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            tdd_pattern: "F|F|F|F|F|F|F|F|F|F|".to_string(),
            beamforming: BeamformingMethod::default(),
            full_buffer: false,
        }
    }
}

/// Errors reported by an engine while it is being configured.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A bearer or route was requested before the spectrum was configured.
    #[error("Engine spectrum is not configured")]
    NotConfigured,

    /// The referenced segment is not part of the configured plan.
    #[error("Unknown segment: {0}")]
    UnknownSegment(SegmentId),

    /// The referenced device is unknown to the engine or cannot hold bearers.
    #[error("Unknown or ineligible device: {0}")]
    UnknownDevice(DeviceId),

    /// The engine refused the request.
    #[error("Engine rejected request: {0}")]
    Rejected(String),
}

/// Configuration interface of the external radio engine.
///
/// Everything below this trait (propagation, beamforming, MAC scheduling) is
/// the engine's business. Calls happen during the sequential configuration
/// phase, before the event loop starts.
pub trait RadioEngine {
    /// Install the carrier segments, their powers and the opaque radio knobs.
    fn configure_spectrum(
        &mut self,
        plan: &SpectrumPlan,
        radio: &RadioConfig,
    ) -> Result<(), EngineError>;

    /// Route every bearer of `qos` onto `segment`.
    fn route_qos(&mut self, qos: QosClass, segment: SegmentId) -> Result<(), EngineError>;

    /// Activate (or extend) a dedicated bearer carrying the request's filter.
    fn activate_dedicated_bearer(&mut self, request: &AdmissionRequest)
        -> Result<(), EngineError>;
}
