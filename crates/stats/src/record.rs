//! Raw per-flow counters produced by the engine.

use slicesim_types::{FiveTuple, FlowId};
use std::time::Duration;

/// Counters for one flow, as left by the engine's flow monitor.
///
/// Times are virtual times since the start of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowRecord {
    pub flow: FlowId,
    pub tuple: FiveTuple,
    pub tx_packets: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    /// Sum of one-way delays of received packets.
    pub delay_sum: Duration,
    /// Sum of delay differences between consecutive received packets.
    pub jitter_sum: Duration,
    /// Transmission time of the first packet.
    pub first_tx: Duration,
    /// Reception time of the last packet.
    pub last_rx: Duration,
}

impl FlowRecord {
    /// An empty record for a newly classified flow.
    pub fn new(flow: FlowId, tuple: FiveTuple) -> Self {
        Self {
            flow,
            tuple,
            tx_packets: 0,
            tx_bytes: 0,
            rx_packets: 0,
            rx_bytes: 0,
            delay_sum: Duration::ZERO,
            jitter_sum: Duration::ZERO,
            first_tx: Duration::ZERO,
            last_rx: Duration::ZERO,
        }
    }
}
