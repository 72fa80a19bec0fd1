//! Turning raw flow counters into per-flow and run-wide statistics.

use crate::{FlowRecord, Report};
use slicesim_types::{FiveTuple, FlowId};
use std::time::Duration;
use tracing::{debug, info};

/// Statistics derived from one [`FlowRecord`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowStats {
    pub flow: FlowId,
    pub tuple: FiveTuple,
    pub tx_packets: u64,
    pub tx_bytes: u64,
    /// Offered load over the application-active window.
    pub tx_offered_mbps: f64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    /// Received bits over `last_rx - first_tx`; zero if nothing arrived.
    pub throughput_mbps: f64,
    /// Zero if nothing arrived.
    pub mean_delay_ms: f64,
    /// Zero if nothing arrived.
    pub mean_jitter_ms: f64,
}

impl FlowStats {
    /// Whether at least one packet of the flow was received.
    pub fn received_any(&self) -> bool {
        self.rx_packets > 0
    }
}

/// Run-wide means over every observed flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub flow_count: usize,
    pub mean_throughput_mbps: f64,
    pub mean_delay_ms: f64,
}

/// Computes flow statistics for a finished run.
#[derive(Debug, Clone, Copy)]
pub struct FlowStatsAggregator {
    /// Length of the application-active window used for offered load.
    active_duration: Duration,
}

impl FlowStatsAggregator {
    pub fn new(active_duration: Duration) -> Self {
        Self { active_duration }
    }

    /// Statistics for a single flow.
    ///
    /// The receive duration runs from the flow's first *transmission* to its
    /// last reception. Degenerate denominators (empty window, zero receive
    /// duration) yield zero rather than a non-finite value.
    pub fn flow_stats(&self, record: &FlowRecord) -> FlowStats {
        let active_secs = self.active_duration.as_secs_f64();
        let tx_offered_mbps = if active_secs > 0.0 {
            record.tx_bytes as f64 * 8.0 / active_secs / 1e6
        } else {
            0.0
        };

        let (throughput_mbps, mean_delay_ms, mean_jitter_ms) = if record.rx_packets > 0 {
            let rx_duration = record.last_rx.saturating_sub(record.first_tx).as_secs_f64();
            let throughput = if rx_duration > 0.0 {
                record.rx_bytes as f64 * 8.0 / rx_duration / 1e6
            } else {
                0.0
            };
            let packets = record.rx_packets as f64;
            (
                throughput,
                1000.0 * record.delay_sum.as_secs_f64() / packets,
                1000.0 * record.jitter_sum.as_secs_f64() / packets,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        FlowStats {
            flow: record.flow,
            tuple: record.tuple,
            tx_packets: record.tx_packets,
            tx_bytes: record.tx_bytes,
            tx_offered_mbps,
            rx_packets: record.rx_packets,
            rx_bytes: record.rx_bytes,
            throughput_mbps,
            mean_delay_ms,
            mean_jitter_ms,
        }
    }

    /// Aggregate every record into a report ordered by flow id.
    ///
    /// Flows without received packets contribute zero to the means but still
    /// count in the denominator. With no flows at all both means are zero.
    pub fn aggregate<'a>(&self, records: impl IntoIterator<Item = &'a FlowRecord>) -> Report {
        let mut flows: Vec<FlowStats> = records
            .into_iter()
            .map(|record| self.flow_stats(record))
            .collect();
        flows.sort_by_key(|stats| stats.flow);

        let summary = summarize(&flows);
        for stats in &flows {
            debug!(
                flow = %stats.flow,
                throughput_mbps = stats.throughput_mbps,
                mean_delay_ms = stats.mean_delay_ms,
                "Flow statistics"
            );
        }
        info!(
            flows = summary.flow_count,
            mean_throughput_mbps = summary.mean_throughput_mbps,
            mean_delay_ms = summary.mean_delay_ms,
            "Aggregated flow statistics"
        );

        Report::new(flows, summary)
    }
}

fn summarize(flows: &[FlowStats]) -> Summary {
    if flows.is_empty() {
        return Summary {
            flow_count: 0,
            mean_throughput_mbps: 0.0,
            mean_delay_ms: 0.0,
        };
    }

    let count = flows.len() as f64;
    let throughput: f64 = flows.iter().map(|f| f.throughput_mbps).sum();
    let delay: f64 = flows.iter().map(|f| f.mean_delay_ms).sum();

    Summary {
        flow_count: flows.len(),
        mean_throughput_mbps: throughput / count,
        mean_delay_ms: delay / count,
    }
}
