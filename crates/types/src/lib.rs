//! Core types shared by every slicing crate.
//!
//! Identifiers are thin newtypes so that a segment index can never be passed
//! where a slice index is expected. Radio quantities (frequencies, powers) are
//! plain `f64` values in SI units (Hz, dBm) because they are forwarded to the
//! external engine unchanged.

mod device;
mod flow;
mod identifiers;
mod qos;
mod rate;

pub use device::{DeviceHandle, DeviceRole};
pub use flow::{AdmissionRequest, FiveTuple, FlowFilter, Protocol, UnknownProtocol};
pub use identifiers::{BearerId, DeviceId, FlowId, SegmentId, SliceId};
pub use qos::{QosClass, TrafficClass, UnknownTrafficClass};
pub use rate::{DataRate, InvalidDataRate};
