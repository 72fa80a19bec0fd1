//! Per-flow packet counters.

use indexmap::IndexMap;
use slicesim_stats::FlowRecord;
use slicesim_types::{FiveTuple, FlowId};
use std::time::Duration;
use tracing::trace;

struct FlowEntry {
    record: FlowRecord,
    /// Delay of the previously received packet, for jitter.
    last_delay: Option<Duration>,
}

/// Classifies packets into flows by five-tuple and counts them.
///
/// Flow ids are handed out from 1 in the order flows send their first
/// packet. Jitter accumulates `|delay_i - delay_(i-1)|` over consecutive
/// received packets of a flow.
#[derive(Default)]
pub struct FlowMonitor {
    flows: IndexMap<FiveTuple, FlowEntry>,
}

impl FlowMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one transmitted packet and return the flow it belongs to.
    pub fn record_tx(&mut self, tuple: FiveTuple, bytes: u32, now: Duration) -> FlowId {
        let next_id = FlowId(self.flows.len() as u32 + 1);
        let entry = self.flows.entry(tuple).or_insert_with(|| {
            trace!(flow = %next_id, %tuple, "New flow");
            FlowEntry {
                record: FlowRecord {
                    first_tx: now,
                    ..FlowRecord::new(next_id, tuple)
                },
                last_delay: None,
            }
        });

        entry.record.tx_packets += 1;
        entry.record.tx_bytes += u64::from(bytes);
        entry.record.flow
    }

    /// Count one received packet of `flow` that was sent at `sent_at`.
    ///
    /// Packets of unknown flows are ignored.
    pub fn record_rx(&mut self, flow: FlowId, bytes: u32, sent_at: Duration, now: Duration) {
        let Some(entry) = (flow.0 as usize)
            .checked_sub(1)
            .and_then(|index| self.flows.get_index_mut(index))
            .map(|(_, entry)| entry)
        else {
            return;
        };

        let delay = now.saturating_sub(sent_at);
        let record = &mut entry.record;
        record.rx_packets += 1;
        record.rx_bytes += u64::from(bytes);
        record.delay_sum += delay;
        record.last_rx = now;
        if let Some(previous) = entry.last_delay {
            record.jitter_sum += if delay > previous {
                delay - previous
            } else {
                previous - delay
            };
        }
        entry.last_delay = Some(delay);
    }

    /// Flow id assigned to `tuple`, if it has sent anything.
    pub fn flow_id(&self, tuple: &FiveTuple) -> Option<FlowId> {
        self.flows.get(tuple).map(|entry| entry.record.flow)
    }

    pub fn record(&self, flow: FlowId) -> Option<&FlowRecord> {
        let index = (flow.0 as usize).checked_sub(1)?;
        self.flows.get_index(index).map(|(_, entry)| &entry.record)
    }

    /// Every flow record in flow-id order.
    pub fn records(&self) -> impl Iterator<Item = &FlowRecord> {
        self.flows.values().map(|entry| &entry.record)
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}
