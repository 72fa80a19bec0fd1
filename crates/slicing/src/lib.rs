//! Slice binding and flow admission.
//!
//! # Architecture
//!
//! ```text
//! class quotas + devices + spectrum plan
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │ SliceBinding::bind                                          │
//! │   class i → segment i, devices split into contiguous groups │
//! │   install_routes: QoS class of slice i → segment i          │
//! └─────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │ FlowAdmissionController::admit_slice (once per slice)       │
//! │   1. next port from the run-wide PortAllocator              │
//! │   2. point FlowFilter on that port                          │
//! │   3. AdmissionRequest{device, bearer, qos, filter}          │
//! │   4. RadioEngine::activate_dedicated_bearer                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Configuration is sequential and finishes before the event loop starts,
//! so the port counter needs no synchronisation.

mod admission;
mod binding;
mod error;
mod ports;

pub use admission::{AdmissionConfig, BearerPolicy, FlowAdmissionController, SliceAdmission};
pub use binding::{ClassQuota, Slice, SliceBinding};
pub use error::SlicingError;
pub use ports::PortAllocator;
