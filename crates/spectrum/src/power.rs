//! Bandwidth-proportional transmit power allocation.

use crate::SpectrumPlan;
use tracing::debug;

/// Convert a power in dB(m) to the linear scale.
pub fn dbm_to_linear(dbm: f64) -> f64 {
    10f64.powf(dbm / 10.0)
}

/// Convert a linear power back to dB(m).
pub fn linear_to_dbm(linear: f64) -> f64 {
    10.0 * linear.log10()
}

/// Shares a total transmit power budget between carrier segments.
///
/// Each segment receives `10·log10((segment_bw / band_bw) · 10^(total/10))`,
/// i.e. power proportional to its share of the band. When the segments cover
/// the whole band the linear powers sum back to the budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerAllocator {
    total_tx_power_dbm: f64,
}

impl PowerAllocator {
    /// Create an allocator for a total budget given in dBm.
    pub fn new(total_tx_power_dbm: f64) -> Self {
        Self { total_tx_power_dbm }
    }

    pub fn total_tx_power_dbm(&self) -> f64 {
        self.total_tx_power_dbm
    }

    /// Power for one segment of width `segment_bandwidth` in a band of width
    /// `band_bandwidth`.
    pub fn segment_power_dbm(&self, segment_bandwidth: f64, band_bandwidth: f64) -> f64 {
        let ratio = segment_bandwidth / band_bandwidth;
        linear_to_dbm(ratio * dbm_to_linear(self.total_tx_power_dbm))
    }

    /// Powers for a list of segment widths, in the same order.
    pub fn allocate(&self, band_bandwidth: f64, segment_bandwidths: &[f64]) -> Vec<f64> {
        segment_bandwidths
            .iter()
            .map(|bw| self.segment_power_dbm(*bw, band_bandwidth))
            .collect()
    }

    /// Write each segment's power into the plan.
    pub fn apply(&self, plan: &mut SpectrumPlan) {
        let band_bandwidth = plan.band().bandwidth;
        for segment in plan.segments_mut() {
            segment.tx_power_dbm = self.segment_power_dbm(segment.bandwidth, band_bandwidth);
            debug!(
                segment = %segment.id,
                tx_power_dbm = segment.tx_power_dbm,
                "Allocated segment power"
            );
        }
        plan.set_total_tx_power(self.total_tx_power_dbm);
    }
}
