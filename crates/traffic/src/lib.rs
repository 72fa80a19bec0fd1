//! Constant-bit-rate packet source.
//!
//! [`TrafficGenerator`] paces fixed-size packets at a configured data rate
//! until its packet budget is spent or it is stopped. It is a synchronous
//! [`StateMachine`](slicesim_core::StateMachine): the runner delivers
//! `Start`, `TimerFired` and `Stop` events and performs the returned
//! endpoint and timer actions against its virtual clock.

mod config;
mod generator;

pub use config::{TrafficError, TrafficGeneratorConfig};
pub use generator::{GeneratorState, TrafficGenerator};
