//! Spectrum planning for sliced radio scenarios.
//!
//! One operation band is split into carrier segments, each with its own
//! center frequency, bandwidth and numerology. Transmit power is then shared
//! between segments in proportion to their bandwidth, which keeps the power
//! spectral density roughly uniform across segments of unequal width.
//!
//! ```text
//! ----------------------------- Band --------------------------------
//! ------Seg0------|--------Seg1---------|-------------Seg2-------------
//! ```
//!
//! Partitioning is pure arithmetic and never fails. Consistency checks
//! (overlap, containment, sane bandwidths) live in [`SpectrumPlan::validate`]
//! and are run explicitly by the caller.

mod error;
mod partition;
mod power;

pub use error::SpectrumError;
pub use partition::{
    edges, Band, BandDefinition, CarrierSegment, SegmentDefinition, SpectrumPartitioner,
    SpectrumPlan,
};
pub use power::{dbm_to_linear, linear_to_dbm, PowerAllocator};
