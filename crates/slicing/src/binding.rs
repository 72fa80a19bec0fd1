//! Binding traffic classes and their devices to carrier segments.

use crate::SlicingError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use slicesim_core::RadioEngine;
use slicesim_spectrum::SpectrumPlan;
use slicesim_types::{DeviceHandle, DeviceId, QosClass, SegmentId, SliceId, TrafficClass};
use std::collections::HashSet;
use tracing::{debug, info};

/// How many devices a traffic class gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassQuota {
    pub class: TrafficClass,
    pub devices: usize,
}

impl ClassQuota {
    pub fn new(class: TrafficClass, devices: usize) -> Self {
        Self { class, devices }
    }
}

/// A traffic class bound to one carrier segment, with its member devices.
///
/// Created once during setup and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    id: SliceId,
    traffic_class: TrafficClass,
    segment: SegmentId,
    members: Vec<DeviceHandle>,
}

impl Slice {
    pub fn id(&self) -> SliceId {
        self.id
    }

    pub fn traffic_class(&self) -> TrafficClass {
        self.traffic_class
    }

    /// QoS class requested for every flow of this slice.
    pub fn qos_class(&self) -> QosClass {
        self.traffic_class.qos_class()
    }

    pub fn segment(&self) -> SegmentId {
        self.segment
    }

    /// Member devices, in the order they were supplied.
    pub fn members(&self) -> &[DeviceHandle] {
        &self.members
    }
}

/// The full set of slices for one run.
#[derive(Debug, Clone)]
pub struct SliceBinding {
    slices: Vec<Slice>,
    /// Reverse index: device -> position of its slice in `slices`.
    device_slice: IndexMap<DeviceId, usize>,
}

impl SliceBinding {
    /// Bind class `i` to segment `i` and split `devices` into contiguous
    /// groups of the quota sizes, in quota order.
    ///
    /// # Errors
    ///
    /// - [`SlicingError::SegmentCountMismatch`] unless there is exactly one
    ///   quota per segment
    /// - [`SlicingError::DuplicateClass`] if a class appears twice
    /// - [`SlicingError::QuotaMismatch`] if the quotas do not sum to the
    ///   device count
    /// - [`SlicingError::DuplicateDevice`] if a device is supplied twice
    /// - [`SlicingError::IneligibleDevice`] for devices that cannot hold bearers
    pub fn bind(
        quotas: &[ClassQuota],
        plan: &SpectrumPlan,
        devices: &[DeviceHandle],
    ) -> Result<Self, SlicingError> {
        if quotas.len() != plan.len() {
            return Err(SlicingError::SegmentCountMismatch {
                classes: quotas.len(),
                segments: plan.len(),
            });
        }

        let mut seen = HashSet::new();
        for quota in quotas {
            if !seen.insert(quota.class) {
                return Err(SlicingError::DuplicateClass(quota.class));
            }
        }

        let quota_sum: usize = quotas.iter().map(|q| q.devices).sum();
        if quota_sum != devices.len() {
            return Err(SlicingError::QuotaMismatch {
                quota_sum,
                devices: devices.len(),
            });
        }

        if let Some(device) = devices.iter().find(|d| !d.role.accepts_bearers()) {
            return Err(SlicingError::IneligibleDevice(device.id));
        }

        let mut ids = HashSet::with_capacity(devices.len());
        if let Some(device) = devices.iter().find(|d| !ids.insert(d.id)) {
            return Err(SlicingError::DuplicateDevice(device.id));
        }

        let mut slices = Vec::with_capacity(quotas.len());
        let mut device_slice = IndexMap::with_capacity(devices.len());
        let mut remaining = devices;

        for (index, (quota, segment)) in quotas.iter().zip(plan.segments()).enumerate() {
            let (group, rest) = remaining.split_at(quota.devices);
            remaining = rest;

            for device in group {
                device_slice.insert(device.id, index);
            }

            let slice = Slice {
                id: SliceId(index as u16),
                traffic_class: quota.class,
                segment: segment.id,
                members: group.to_vec(),
            };
            debug!(
                slice = %slice.id,
                class = %slice.traffic_class,
                segment = %slice.segment,
                members = slice.members.len(),
                "Bound slice"
            );
            slices.push(slice);
        }

        info!(slices = slices.len(), devices = devices.len(), "Slices bound");

        Ok(Self {
            slices,
            device_slice,
        })
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn slice(&self, id: SliceId) -> Option<&Slice> {
        self.slices.get(id.0 as usize)
    }

    /// The slice a device belongs to.
    pub fn slice_for_device(&self, device: DeviceId) -> Option<&Slice> {
        self.device_slice
            .get(&device)
            .and_then(|index| self.slices.get(*index))
    }

    /// QoS class → segment routes implied by the binding.
    pub fn qos_routes(&self) -> Vec<(QosClass, SegmentId)> {
        self.slices
            .iter()
            .map(|slice| (slice.qos_class(), slice.segment))
            .collect()
    }

    /// Tell the engine which segment carries each slice's QoS class.
    pub fn install_routes<E: RadioEngine>(&self, engine: &mut E) -> Result<(), SlicingError> {
        for (qos, segment) in self.qos_routes() {
            engine.route_qos(qos, segment)?;
            debug!(qos = %qos, segment = %segment, "Installed QoS route");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicesim_spectrum::{BandDefinition, SegmentDefinition, SpectrumPartitioner};
    use slicesim_types::DeviceRole;
    use std::net::Ipv4Addr;

    fn plan(segments: usize) -> SpectrumPlan {
        let defs: Vec<_> = (0..segments)
            .map(|i| SegmentDefinition {
                center_frequency: 27e9 + i as f64 * 1e9,
                bandwidth: 300e6,
                numerology: 3,
            })
            .collect();
        SpectrumPartitioner::partition(
            &BandDefinition {
                center_frequency: 28e9,
                bandwidth: 3e9,
            },
            &defs,
        )
    }

    fn user_devices(n: u32) -> Vec<DeviceHandle> {
        (0..n)
            .map(|i| {
                DeviceHandle::new(
                    DeviceId(i),
                    DeviceRole::UserEquipment,
                    Ipv4Addr::new(7, 0, 0, 2 + i as u8),
                )
            })
            .collect()
    }

    fn default_quotas() -> Vec<ClassQuota> {
        vec![
            ClassQuota::new(TrafficClass::InteractiveVideo, 2),
            ClassQuota::new(TrafficClass::CloudGaming, 3),
            ClassQuota::new(TrafficClass::VehicularControl, 4),
        ]
    }

    #[test]
    fn test_groups_follow_quotas() {
        let devices = user_devices(9);
        let binding = SliceBinding::bind(&default_quotas(), &plan(3), &devices).unwrap();

        let sizes: Vec<_> = binding.slices().iter().map(|s| s.members().len()).collect();
        assert_eq!(sizes, vec![2, 3, 4]);

        // Contiguous, disjoint and covering every device exactly once.
        let flattened: Vec<_> = binding
            .slices()
            .iter()
            .flat_map(|s| s.members().iter().map(|d| d.id))
            .collect();
        let expected: Vec<_> = devices.iter().map(|d| d.id).collect();
        assert_eq!(flattened, expected);

        let unique: HashSet<_> = flattened.iter().collect();
        assert_eq!(unique.len(), 9);
    }

    #[test]
    fn test_class_bound_to_segment_by_position() {
        let binding = SliceBinding::bind(&default_quotas(), &plan(3), &user_devices(9)).unwrap();

        for (i, slice) in binding.slices().iter().enumerate() {
            assert_eq!(slice.id(), SliceId(i as u16));
            assert_eq!(slice.segment(), SegmentId(i as u8));
        }
        assert_eq!(
            binding.slices()[1].traffic_class(),
            TrafficClass::CloudGaming
        );
    }

    #[test]
    fn test_slice_for_device() {
        let binding = SliceBinding::bind(&default_quotas(), &plan(3), &user_devices(9)).unwrap();

        assert_eq!(
            binding.slice_for_device(DeviceId(1)).map(|s| s.id()),
            Some(SliceId(0))
        );
        assert_eq!(
            binding.slice_for_device(DeviceId(2)).map(|s| s.id()),
            Some(SliceId(1))
        );
        assert_eq!(
            binding.slice_for_device(DeviceId(8)).map(|s| s.id()),
            Some(SliceId(2))
        );
        assert!(binding.slice_for_device(DeviceId(9)).is_none());
    }

    #[test]
    fn test_quota_mismatch_rejected() {
        let result = SliceBinding::bind(&default_quotas(), &plan(3), &user_devices(8));
        assert_eq!(
            result.unwrap_err(),
            SlicingError::QuotaMismatch {
                quota_sum: 9,
                devices: 8,
            }
        );
    }

    #[test]
    fn test_segment_count_mismatch_rejected() {
        let result = SliceBinding::bind(&default_quotas(), &plan(2), &user_devices(9));
        assert_eq!(
            result.unwrap_err(),
            SlicingError::SegmentCountMismatch {
                classes: 3,
                segments: 2,
            }
        );
    }

    #[test]
    fn test_duplicate_class_rejected() {
        let quotas = vec![
            ClassQuota::new(TrafficClass::CloudGaming, 1),
            ClassQuota::new(TrafficClass::CloudGaming, 1),
        ];
        let result = SliceBinding::bind(&quotas, &plan(2), &user_devices(2));
        assert_eq!(
            result.unwrap_err(),
            SlicingError::DuplicateClass(TrafficClass::CloudGaming)
        );
    }

    #[test]
    fn test_base_station_cannot_join_slice() {
        let mut devices = user_devices(2);
        devices[1].role = DeviceRole::BaseStation;
        let quotas = vec![ClassQuota::new(TrafficClass::CloudGaming, 2)];

        let result = SliceBinding::bind(&quotas, &plan(1), &devices);
        assert_eq!(result.unwrap_err(), SlicingError::IneligibleDevice(DeviceId(1)));
    }

    #[test]
    fn test_repeated_device_rejected() {
        let mut devices = user_devices(9);
        devices[5] = devices[1];

        let result = SliceBinding::bind(&default_quotas(), &plan(3), &devices);
        assert_eq!(result.unwrap_err(), SlicingError::DuplicateDevice(DeviceId(1)));
    }

    #[test]
    fn test_empty_quota_yields_empty_slice() {
        let quotas = vec![
            ClassQuota::new(TrafficClass::InteractiveVideo, 0),
            ClassQuota::new(TrafficClass::CloudGaming, 2),
        ];
        let binding = SliceBinding::bind(&quotas, &plan(2), &user_devices(2)).unwrap();
        assert!(binding.slices()[0].members().is_empty());
        assert_eq!(binding.slices()[1].members().len(), 2);
    }

    #[test]
    fn test_qos_routes() {
        let binding = SliceBinding::bind(&default_quotas(), &plan(3), &user_devices(9)).unwrap();
        assert_eq!(
            binding.qos_routes(),
            vec![
                (QosClass::NgbrVideoTcpDefault, SegmentId(0)),
                (QosClass::GbrGaming, SegmentId(1)),
                (QosClass::NgbrV2x, SegmentId(2)),
            ]
        );
    }
}
