//! Error types for slice binding and admission.

use slicesim_core::EngineError;
use slicesim_types::{DeviceId, SliceId, TrafficClass};
use thiserror::Error;

/// Errors raised while binding slices or admitting flows.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SlicingError {
    /// Device quotas do not add up to the number of devices supplied.
    #[error("Device quotas sum to {quota_sum} but {devices} devices were supplied")]
    QuotaMismatch { quota_sum: usize, devices: usize },

    /// The number of traffic classes differs from the number of carrier segments.
    #[error("{classes} traffic classes cannot be bound to {segments} carrier segments")]
    SegmentCountMismatch { classes: usize, segments: usize },

    /// The same traffic class was given to two slices.
    #[error("Traffic class {0} is bound to more than one slice")]
    DuplicateClass(TrafficClass),

    /// The same device was supplied more than once.
    #[error("{0} appears more than once in the device list")]
    DuplicateDevice(DeviceId),

    /// A device whose role cannot hold bearers was offered to a slice.
    #[error("{0} cannot be a slice member")]
    IneligibleDevice(DeviceId),

    /// Admission was requested for a slice the binding does not know.
    #[error("Unknown slice: {0}")]
    UnknownSlice(SliceId),

    /// No local port at or above the requested base is left.
    #[error("Local ports exhausted (base port {base})")]
    PortsExhausted { base: u16 },

    /// A device ran out of bearer identifiers.
    #[error("Bearer identifiers exhausted for {0}")]
    BearersExhausted(DeviceId),

    /// The engine refused part of the configuration.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
