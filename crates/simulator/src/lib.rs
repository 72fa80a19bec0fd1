//! Radio slicing scenarios.
//!
//! Ties the slicing crates together: a [`ScenarioConfig`] describes the band,
//! the slices and their traffic; [`Scenario::run`] partitions the spectrum,
//! configures the engine, binds slices, admits flows, drives the generators
//! through the event loop and writes the flow report.
//!
//! # Example
//!
//! ```ignore
//! use slicesim_simulator::{Scenario, ScenarioConfig};
//! use std::time::Duration;
//!
//! let config = ScenarioConfig::default()
//!     .with_duration(Duration::from_secs(2))
//!     .with_run_id("two-seconds");
//!
//! let outcome = Scenario::new(config)?.run()?;
//! println!("{}", outcome.report);
//! ```

pub mod config;
pub mod scenario;
pub mod topology;

pub use config::{ConfigError, ScenarioConfig, SliceConfig};
pub use scenario::{Scenario, ScenarioError, ScenarioOutcome};
pub use topology::{Topology, TopologyBuilder};
