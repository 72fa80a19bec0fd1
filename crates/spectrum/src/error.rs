//! Error types for spectrum planning.

use slicesim_types::SegmentId;
use thiserror::Error;

/// Inconsistencies detected when validating a spectrum plan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectrumError {
    /// The plan has no segments.
    #[error("Spectrum plan has no carrier segments")]
    NoSegments,

    /// More segments than segment identifiers can address.
    #[error("Too many carrier segments: {0}")]
    TooManySegments(usize),

    /// The band itself has a non-finite or non-positive bandwidth or center.
    #[error("Invalid band: center {center_frequency} Hz, bandwidth {bandwidth} Hz")]
    InvalidBand {
        center_frequency: f64,
        bandwidth: f64,
    },

    /// A segment has a non-finite or non-positive bandwidth or center.
    #[error("Invalid {segment}: center {center_frequency} Hz, bandwidth {bandwidth} Hz")]
    InvalidSegment {
        segment: SegmentId,
        center_frequency: f64,
        bandwidth: f64,
    },

    /// Two segments share part of the spectrum.
    #[error("{first} overlaps {second}")]
    Overlap { first: SegmentId, second: SegmentId },

    /// A segment extends beyond the band edges.
    #[error("{0} lies outside the band")]
    OutsideBand(SegmentId),

    /// The total power budget is not a finite number.
    #[error("Invalid total transmit power: {0} dBm")]
    InvalidPower(f64),
}
