//! Post-run flow statistics.
//!
//! After the event loop finishes, the engine's flow monitor hands over one
//! [`FlowRecord`] per classified flow. [`FlowStatsAggregator`] turns those raw
//! counters into throughput, delay and jitter figures and a run-wide summary,
//! and [`ReportWriter`] persists the resulting [`Report`] as plain text.
//!
//! Flows that received nothing report zero throughput, delay and jitter, and
//! still count in the run-wide means.

mod aggregate;
mod error;
mod record;
mod report;

pub use aggregate::{FlowStats, FlowStatsAggregator, Summary};
pub use error::StatsError;
pub use record::FlowRecord;
pub use report::{Report, ReportWriter};
