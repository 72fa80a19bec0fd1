//! Core abstractions shared by the slicing crates.
//!
//! Applications are written as synchronous state machines: they consume
//! [`Event`]s and return [`Action`]s, and the runner that owns the virtual
//! clock performs every side effect. Configuration of the external radio
//! engine goes through the [`RadioEngine`] trait.

mod action;
mod engine;
mod event;
mod traits;

pub use action::Action;
pub use engine::{BeamformingMethod, EngineError, RadioConfig, RadioEngine};
pub use event::{Event, TimerId};
pub use traits::StateMachine;
