//! Splitting an operation band into carrier segments.

use crate::{PowerAllocator, SpectrumError};
use serde::{Deserialize, Serialize};
use slicesim_types::SegmentId;
use std::time::Duration;
use tracing::debug;

/// Lower and higher edge of a channel centered at `center` with width `bandwidth`.
pub fn edges(center_frequency: f64, bandwidth: f64) -> (f64, f64) {
    (
        center_frequency - bandwidth / 2.0,
        center_frequency + bandwidth / 2.0,
    )
}

/// Requested band: center frequency and total bandwidth, in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandDefinition {
    pub center_frequency: f64,
    pub bandwidth: f64,
}

/// Requested carrier segment inside the band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentDefinition {
    /// Center frequency in Hz.
    pub center_frequency: f64,
    /// Bandwidth in Hz.
    pub bandwidth: f64,
    /// Numerology index, forwarded to the engine unchanged.
    pub numerology: u8,
}

/// The operation band with its computed edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub center_frequency: f64,
    pub bandwidth: f64,
    pub lower_edge: f64,
    pub higher_edge: f64,
}

impl Band {
    fn new(definition: &BandDefinition) -> Self {
        let (lower_edge, higher_edge) = edges(definition.center_frequency, definition.bandwidth);
        Self {
            center_frequency: definition.center_frequency,
            bandwidth: definition.bandwidth,
            lower_edge,
            higher_edge,
        }
    }
}

/// One carrier segment of the band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarrierSegment {
    pub id: SegmentId,
    pub center_frequency: f64,
    pub bandwidth: f64,
    pub lower_edge: f64,
    pub higher_edge: f64,
    pub numerology: u8,
    /// Transmit power assigned by [`PowerAllocator`]; zero until allocated.
    pub tx_power_dbm: f64,
}

impl CarrierSegment {
    /// Slot length implied by the numerology (1 ms / 2^numerology).
    pub fn slot_duration(&self) -> Duration {
        Duration::from_nanos(1_000_000 >> self.numerology.min(19))
    }

    /// Share of the band's bandwidth occupied by this segment.
    pub fn bandwidth_ratio(&self, band: &Band) -> f64 {
        self.bandwidth / band.bandwidth
    }

    fn overlaps(&self, other: &CarrierSegment) -> bool {
        self.lower_edge < other.higher_edge && other.lower_edge < self.higher_edge
    }
}

/// Splits a band into the caller-supplied carrier segments.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpectrumPartitioner;

impl SpectrumPartitioner {
    /// Compute the band edges and one segment per definition, in order.
    ///
    /// Segment `i` gets `SegmentId(i)`. No consistency checks are performed
    /// here; invalid numbers propagate into the returned plan. Definitions
    /// beyond the last addressable [`SegmentId`] are left out of the plan and
    /// reported by [`SpectrumPlan::validate`].
    pub fn partition(band: &BandDefinition, segments: &[SegmentDefinition]) -> SpectrumPlan {
        let band = Band::new(band);
        let requested_segments = segments.len();
        let segments = segments
            .iter()
            .zip(0..=u8::MAX)
            .map(|(def, id)| {
                let (lower_edge, higher_edge) = edges(def.center_frequency, def.bandwidth);
                CarrierSegment {
                    id: SegmentId(id),
                    center_frequency: def.center_frequency,
                    bandwidth: def.bandwidth,
                    lower_edge,
                    higher_edge,
                    numerology: def.numerology,
                    tx_power_dbm: 0.0,
                }
            })
            .collect::<Vec<_>>();

        debug!(
            center = band.center_frequency,
            bandwidth = band.bandwidth,
            segments = segments.len(),
            "Partitioned band"
        );

        SpectrumPlan {
            band,
            segments,
            requested_segments,
            total_tx_power_dbm: None,
        }
    }
}

/// A partitioned band, optionally with per-segment power assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumPlan {
    band: Band,
    segments: Vec<CarrierSegment>,
    /// Number of definitions the plan was built from.
    requested_segments: usize,
    total_tx_power_dbm: Option<f64>,
}

impl SpectrumPlan {
    /// Partition the band and share `total_tx_power_dbm` between segments.
    pub fn build(
        band: &BandDefinition,
        segments: &[SegmentDefinition],
        total_tx_power_dbm: f64,
    ) -> Self {
        let mut plan = SpectrumPartitioner::partition(band, segments);
        PowerAllocator::new(total_tx_power_dbm).apply(&mut plan);
        plan
    }

    pub fn band(&self) -> &Band {
        &self.band
    }

    pub fn segments(&self) -> &[CarrierSegment] {
        &self.segments
    }

    pub fn segment(&self, id: SegmentId) -> Option<&CarrierSegment> {
        self.segments.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total power budget the segments were allocated from, if allocated.
    pub fn total_tx_power_dbm(&self) -> Option<f64> {
        self.total_tx_power_dbm
    }

    pub(crate) fn segments_mut(&mut self) -> &mut [CarrierSegment] {
        &mut self.segments
    }

    pub(crate) fn set_total_tx_power(&mut self, total_tx_power_dbm: f64) {
        self.total_tx_power_dbm = Some(total_tx_power_dbm);
    }

    /// Check the plan for inconsistencies the partitioner lets through.
    ///
    /// Rejects empty plans, non-finite or non-positive frequencies and
    /// bandwidths, overlapping segments, segments outside the band and a
    /// non-finite power budget. Segments that only touch at an edge are
    /// accepted.
    pub fn validate(&self) -> Result<(), SpectrumError> {
        if self.segments.is_empty() {
            return Err(SpectrumError::NoSegments);
        }
        if self.requested_segments > self.segments.len() {
            return Err(SpectrumError::TooManySegments(self.requested_segments));
        }
        if !is_positive(self.band.center_frequency) || !is_positive(self.band.bandwidth) {
            return Err(SpectrumError::InvalidBand {
                center_frequency: self.band.center_frequency,
                bandwidth: self.band.bandwidth,
            });
        }
        if let Some(power) = self.total_tx_power_dbm {
            if !power.is_finite() {
                return Err(SpectrumError::InvalidPower(power));
            }
        }

        for segment in &self.segments {
            if !is_positive(segment.center_frequency) || !is_positive(segment.bandwidth) {
                return Err(SpectrumError::InvalidSegment {
                    segment: segment.id,
                    center_frequency: segment.center_frequency,
                    bandwidth: segment.bandwidth,
                });
            }
            if segment.lower_edge < self.band.lower_edge
                || segment.higher_edge > self.band.higher_edge
            {
                return Err(SpectrumError::OutsideBand(segment.id));
            }
        }

        for (i, first) in self.segments.iter().enumerate() {
            for second in &self.segments[i + 1..] {
                if first.overlaps(second) {
                    return Err(SpectrumError::Overlap {
                        first: first.id,
                        second: second.id,
                    });
                }
            }
        }

        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn band() -> BandDefinition {
        BandDefinition {
            center_frequency: 28e9,
            bandwidth: 3e9,
        }
    }

    fn segment(center_frequency: f64, bandwidth: f64, numerology: u8) -> SegmentDefinition {
        SegmentDefinition {
            center_frequency,
            bandwidth,
            numerology,
        }
    }

    fn three_segments() -> Vec<SegmentDefinition> {
        vec![
            segment(27e9, 400e6, 3),
            segment(28e9, 300e6, 4),
            segment(29e9, 300e6, 3),
        ]
    }

    #[test]
    fn test_band_edges() {
        let plan = SpectrumPartitioner::partition(&band(), &three_segments());
        assert_eq!(plan.band().lower_edge, 26.5e9);
        assert_eq!(plan.band().higher_edge, 29.5e9);
    }

    #[test]
    fn test_segments_bracket_center_symmetrically() {
        let plan = SpectrumPartitioner::partition(&band(), &three_segments());
        assert_eq!(plan.len(), 3);

        for seg in plan.segments() {
            assert_eq!(seg.center_frequency - seg.lower_edge, seg.bandwidth / 2.0);
            assert_eq!(seg.higher_edge - seg.center_frequency, seg.bandwidth / 2.0);
        }
        assert_eq!(plan.segments()[0].lower_edge, 26.8e9);
        assert_eq!(plan.segments()[0].higher_edge, 27.2e9);
    }

    #[test]
    fn test_segment_ids_follow_definition_order() {
        let plan = SpectrumPartitioner::partition(&band(), &three_segments());
        let ids: Vec<_> = plan.segments().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SegmentId(0), SegmentId(1), SegmentId(2)]);
        assert_eq!(plan.segment(SegmentId(1)).map(|s| s.numerology), Some(4));
        assert!(plan.segment(SegmentId(3)).is_none());
    }

    #[test]
    fn test_partition_does_not_validate() {
        // Overlapping and out-of-band numbers still partition.
        let plan = SpectrumPartitioner::partition(
            &band(),
            &[segment(28e9, 2e9, 3), segment(28.5e9, 5e9, 3)],
        );
        assert_eq!(plan.len(), 2);
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_disjoint_segments() {
        let plan = SpectrumPlan::build(&band(), &three_segments(), 8.0);
        assert_eq!(plan.validate(), Ok(()));
    }

    #[test]
    fn test_validate_accepts_touching_segments() {
        let plan = SpectrumPartitioner::partition(
            &band(),
            &[segment(27e9, 1e9, 3), segment(28e9, 1e9, 3), segment(29e9, 1e9, 3)],
        );
        assert_eq!(plan.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let plan = SpectrumPartitioner::partition(
            &band(),
            &[segment(27.5e9, 2e9, 3), segment(28e9, 0.5e9, 3)],
        );
        assert_eq!(
            plan.validate(),
            Err(SpectrumError::Overlap {
                first: SegmentId(0),
                second: SegmentId(1),
            })
        );
    }

    #[test]
    fn test_validate_rejects_outside_band() {
        let plan = SpectrumPartitioner::partition(&band(), &[segment(29.4e9, 400e6, 3)]);
        assert_eq!(plan.validate(), Err(SpectrumError::OutsideBand(SegmentId(0))));
    }

    #[test]
    fn test_validate_rejects_bad_numbers() {
        let plan = SpectrumPartitioner::partition(&band(), &[segment(28e9, f64::NAN, 3)]);
        assert!(matches!(
            plan.validate(),
            Err(SpectrumError::InvalidSegment { .. })
        ));

        let plan = SpectrumPartitioner::partition(&band(), &[segment(28e9, -1e6, 3)]);
        assert!(matches!(
            plan.validate(),
            Err(SpectrumError::InvalidSegment { .. })
        ));

        let plan = SpectrumPartitioner::partition(&band(), &[]);
        assert_eq!(plan.validate(), Err(SpectrumError::NoSegments));
    }

    #[test]
    fn test_excess_segments_never_share_ids() {
        let defs = vec![segment(28e9, 1e6, 3); 300];
        let plan = SpectrumPartitioner::partition(&band(), &defs);

        assert_eq!(plan.len(), 256);
        let ids: HashSet<_> = plan.segments().iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), 256);
        assert_eq!(plan.validate(), Err(SpectrumError::TooManySegments(300)));
    }

    #[test]
    fn test_slot_duration_from_numerology() {
        let plan = SpectrumPartitioner::partition(&band(), &three_segments());
        assert_eq!(plan.segments()[0].slot_duration(), Duration::from_micros(125));
        assert_eq!(plan.segments()[1].slot_duration(), Duration::from_nanos(62_500));
    }
}
