//! Deterministic simulation runner.
//!
//! This crate drives traffic generators through an in-process radio engine
//! on a virtual clock. Given the same configuration and seed, it produces
//! identical flow records every run.
//!
//! # Architecture
//!
//! ```text
//!   EventQueue: BTreeMap<(time, sequence), SimEvent>
//!        │
//!        ├── Application { app, Start | Stop | TimerFired }
//!        │        │
//!        │        ▼
//!        │   TrafficGenerator::step ──► [Action]
//!        │                                 │
//!        │        SetTimer / CancelTimer ◄─┤
//!        │                                 ▼ Transmit
//!        │                 FlowMonitor::record_tx
//!        │                 SimulatedEngine::classify + transit_delay
//!        │                                 │
//!        └── Deliver { flow } ◄────────────┘ (dropped if past the end)
//!                 │
//!                 ▼
//!        FlowMonitor::record_rx
//! ```

mod engine;
mod event_queue;
mod monitor;
mod runner;

pub use engine::{LinkConfig, Route, SimulatedEngine};
pub use event_queue::{EventKey, EventQueue, SimEvent};
pub use monitor::FlowMonitor;
pub use runner::{AppId, SimulationRunner, SimulationStats};
