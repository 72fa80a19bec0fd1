//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Carrier segment identifier (position within the band).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u8);

impl SegmentId {
    /// Position of the segment inside its band.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Segment({})", self.0)
    }
}

/// Slice identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SliceId(pub u16);

impl fmt::Display for SliceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slice({})", self.0)
    }
}

/// Device identifier, unique across all roles in one topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Device({})", self.0)
    }
}

/// Flow identifier.
///
/// Assigned by whoever classifies traffic (the engine's flow monitor), starting
/// at 1. Reports are ordered by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(pub u32);

impl FlowId {
    /// First identifier handed out in a run.
    pub const FIRST: Self = FlowId(1);

    /// Get the next flow identifier.
    pub fn next(self) -> Self {
        FlowId(self.0 + 1)
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dedicated bearer identifier, scoped to one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerId(pub u8);

impl BearerId {
    /// The device's default bearer. Dedicated bearers are numbered after it.
    pub const DEFAULT: Self = BearerId(1);

    /// Get the next bearer identifier, or `None` once the space is exhausted.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(BearerId)
    }
}

impl fmt::Display for BearerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bearer({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_id_sequence() {
        assert_eq!(FlowId::FIRST.next(), FlowId(2));
        assert_eq!(FlowId(41).to_string(), "41");
    }

    #[test]
    fn test_identifier_display() {
        assert_eq!(SegmentId(2).to_string(), "Segment(2)");
        assert_eq!(SliceId(0).to_string(), "Slice(0)");
        assert_eq!(DeviceId(7).to_string(), "Device(7)");
        assert_eq!(BearerId(1).to_string(), "Bearer(1)");
    }

    #[test]
    fn test_bearer_id_exhaustion() {
        assert_eq!(BearerId::DEFAULT.next(), Some(BearerId(2)));
        assert_eq!(BearerId(u8::MAX).next(), None);
    }
}
