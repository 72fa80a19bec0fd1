//! Per-flow admission: port allocation, packet filters and dedicated bearers.

use crate::{PortAllocator, Slice, SlicingError};
use serde::{Deserialize, Serialize};
use slicesim_core::RadioEngine;
use slicesim_types::{AdmissionRequest, BearerId, DeviceId, FlowFilter, FlowId, Protocol};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// How sub-flows of one device map onto bearers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BearerPolicy {
    /// One dedicated bearer per device carrying every sub-flow filter.
    #[default]
    Shared,
    /// A distinct dedicated bearer for each sub-flow.
    PerFlow,
}

/// Controller-wide admission settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionConfig {
    /// Transport protocol every filter matches.
    pub protocol: Protocol,
    /// Bearer policy for multi-flow devices.
    pub bearer_policy: BearerPolicy,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::Udp,
            bearer_policy: BearerPolicy::default(),
        }
    }
}

/// What one slice's traffic mix asks of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceAdmission {
    /// First port the slice's flows may use.
    pub base_port: u16,
    /// Simultaneous sub-flows per member device.
    pub sub_flows: u16,
}

/// Issues admission requests for every device/sub-flow pair of each slice.
///
/// A single controller serves a whole run: its port allocator is the only
/// state shared between otherwise independent slice setups, and sharing it is
/// what keeps `(port, protocol)` pairs unique across the run.
pub struct FlowAdmissionController {
    config: AdmissionConfig,
    ports: PortAllocator,
    next_flow: FlowId,
    /// Last bearer handed to each device.
    bearers: HashMap<DeviceId, BearerId>,
}

impl FlowAdmissionController {
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            config,
            ports: PortAllocator::new(),
            next_flow: FlowId::FIRST,
            bearers: HashMap::new(),
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Number of flows admitted so far.
    pub fn admitted(&self) -> usize {
        self.ports.allocated()
    }

    /// Admit every sub-flow of every member of `slice` and hand the requests
    /// to `engine`.
    ///
    /// Returns the issued requests in issue order: device by device, sub-flow
    /// by sub-flow.
    pub fn admit_slice<E: RadioEngine>(
        &mut self,
        engine: &mut E,
        slice: &Slice,
        admission: SliceAdmission,
    ) -> Result<Vec<AdmissionRequest>, SlicingError> {
        if admission.sub_flows == 0 && !slice.members().is_empty() {
            warn!(slice = %slice.id(), "Slice traffic mix has no sub-flows");
        }

        let qos = slice.qos_class();
        let mut requests =
            Vec::with_capacity(slice.members().len() * admission.sub_flows as usize);

        for device in slice.members() {
            let mut bearer = None;
            for _ in 0..admission.sub_flows {
                let bearer_id = match (self.config.bearer_policy, bearer) {
                    (BearerPolicy::Shared, Some(id)) => id,
                    _ => self.next_bearer(device.id)?,
                };
                bearer = Some(bearer_id);

                let port = self.ports.allocate(admission.base_port)?;
                let filter =
                    FlowFilter::point(self.next_flow, port, self.config.protocol, slice.id());
                self.next_flow = self.next_flow.next();

                let request = AdmissionRequest {
                    device: device.id,
                    bearer: bearer_id,
                    qos,
                    filter,
                };
                engine.activate_dedicated_bearer(&request)?;

                debug!(
                    device = %device.id,
                    bearer = %bearer_id,
                    qos = %qos,
                    port,
                    protocol = %self.config.protocol,
                    "Admitted flow"
                );
                requests.push(request);
            }
        }

        info!(
            slice = %slice.id(),
            class = %slice.traffic_class(),
            flows = requests.len(),
            "Slice admitted"
        );
        Ok(requests)
    }

    fn next_bearer(&mut self, device: DeviceId) -> Result<BearerId, SlicingError> {
        let last = self.bearers.get(&device).copied().unwrap_or(BearerId::DEFAULT);
        let next = last.next().ok_or(SlicingError::BearersExhausted(device))?;
        self.bearers.insert(device, next);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassQuota, SliceBinding};
    use slicesim_core::{EngineError, RadioConfig};
    use slicesim_spectrum::{BandDefinition, SegmentDefinition, SpectrumPlan};
    use slicesim_types::{DeviceHandle, DeviceRole, QosClass, SegmentId, SliceId, TrafficClass};
    use std::collections::HashSet;
    use std::net::Ipv4Addr;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct RecordingEngine {
        bearers: Vec<AdmissionRequest>,
        reject_device: Option<DeviceId>,
    }

    impl RadioEngine for RecordingEngine {
        fn configure_spectrum(
            &mut self,
            _plan: &SpectrumPlan,
            _radio: &RadioConfig,
        ) -> Result<(), EngineError> {
            Ok(())
        }

        fn route_qos(&mut self, _qos: QosClass, _segment: SegmentId) -> Result<(), EngineError> {
            Ok(())
        }

        fn activate_dedicated_bearer(
            &mut self,
            request: &AdmissionRequest,
        ) -> Result<(), EngineError> {
            if self.reject_device == Some(request.device) {
                return Err(EngineError::UnknownDevice(request.device));
            }
            self.bearers.push(*request);
            Ok(())
        }
    }

    fn binding() -> SliceBinding {
        let plan = SpectrumPlan::build(
            &BandDefinition {
                center_frequency: 28e9,
                bandwidth: 3e9,
            },
            &[
                SegmentDefinition {
                    center_frequency: 27e9,
                    bandwidth: 400e6,
                    numerology: 3,
                },
                SegmentDefinition {
                    center_frequency: 28e9,
                    bandwidth: 300e6,
                    numerology: 4,
                },
                SegmentDefinition {
                    center_frequency: 29e9,
                    bandwidth: 300e6,
                    numerology: 3,
                },
            ],
            8.0,
        );
        let devices: Vec<_> = (0..9)
            .map(|i| {
                DeviceHandle::new(
                    DeviceId(i),
                    DeviceRole::UserEquipment,
                    Ipv4Addr::new(7, 0, 0, 2 + i as u8),
                )
            })
            .collect();
        let quotas = [
            ClassQuota::new(TrafficClass::InteractiveVideo, 2),
            ClassQuota::new(TrafficClass::CloudGaming, 3),
            ClassQuota::new(TrafficClass::VehicularControl, 4),
        ];
        SliceBinding::bind(&quotas, &plan, &devices).unwrap()
    }

    const BASES: [u16; 3] = [1001, 1101, 1201];

    fn admit_all(
        controller: &mut FlowAdmissionController,
        engine: &mut RecordingEngine,
        sub_flows: u16,
    ) -> Vec<AdmissionRequest> {
        let binding = binding();
        let mut all = Vec::new();
        for (slice, base_port) in binding.slices().iter().zip(BASES) {
            let requests = controller
                .admit_slice(
                    engine,
                    slice,
                    SliceAdmission {
                        base_port,
                        sub_flows,
                    },
                )
                .unwrap();
            all.extend(requests);
        }
        all
    }

    #[test]
    #[traced_test]
    fn test_port_protocol_pairs_are_unique() {
        let mut controller = FlowAdmissionController::new(AdmissionConfig::default());
        let mut engine = RecordingEngine::default();

        let requests = admit_all(&mut controller, &mut engine, 3);

        assert_eq!(requests.len(), 27);
        let pairs: HashSet<_> = requests
            .iter()
            .map(|r| (r.filter.local_port_start, r.filter.protocol))
            .collect();
        assert_eq!(pairs.len(), 27);
        assert_eq!(engine.bearers, requests);
        assert_eq!(controller.admitted(), 27);
        assert!(logs_contain("Slice admitted"));
    }

    #[test]
    fn test_point_filters_start_at_slice_base() {
        let mut controller = FlowAdmissionController::new(AdmissionConfig::default());
        let mut engine = RecordingEngine::default();

        let requests = admit_all(&mut controller, &mut engine, 1);

        for request in &requests {
            assert_eq!(request.filter.local_port_start, request.filter.local_port_end);
        }
        let ports: Vec<_> = requests.iter().map(|r| r.filter.local_port_start).collect();
        assert_eq!(
            ports,
            vec![1001, 1002, 1101, 1102, 1103, 1201, 1202, 1203, 1204]
        );
    }

    #[test]
    fn test_qos_and_slice_tagging() {
        let mut controller = FlowAdmissionController::new(AdmissionConfig::default());
        let mut engine = RecordingEngine::default();

        let requests = admit_all(&mut controller, &mut engine, 1);

        assert_eq!(requests[0].qos, QosClass::NgbrVideoTcpDefault);
        assert_eq!(requests[0].filter.slice, SliceId(0));
        assert_eq!(requests[2].qos, QosClass::GbrGaming);
        assert_eq!(requests[2].filter.slice, SliceId(1));
        assert_eq!(requests[8].qos, QosClass::NgbrV2x);
        assert_eq!(requests[8].filter.slice, SliceId(2));

        let flows: Vec<_> = requests.iter().map(|r| r.filter.flow.0).collect();
        assert_eq!(flows, (1..=9).collect::<Vec<_>>());
    }

    #[test]
    fn test_shared_bearer_policy_reuses_bearer() {
        let mut controller = FlowAdmissionController::new(AdmissionConfig {
            protocol: Protocol::Tcp,
            bearer_policy: BearerPolicy::Shared,
        });
        let mut engine = RecordingEngine::default();

        let requests = admit_all(&mut controller, &mut engine, 3);

        for request in &requests {
            assert_eq!(request.bearer, BearerId(2));
            assert_eq!(request.filter.protocol, Protocol::Tcp);
        }
    }

    #[test]
    fn test_per_flow_bearer_policy_creates_distinct_bearers() {
        let mut controller = FlowAdmissionController::new(AdmissionConfig {
            protocol: Protocol::Udp,
            bearer_policy: BearerPolicy::PerFlow,
        });
        let mut engine = RecordingEngine::default();

        let requests = admit_all(&mut controller, &mut engine, 3);

        let first_device: Vec<_> = requests
            .iter()
            .filter(|r| r.device == DeviceId(0))
            .map(|r| r.bearer)
            .collect();
        assert_eq!(first_device, vec![BearerId(2), BearerId(3), BearerId(4)]);

        let pairs: HashSet<_> = requests.iter().map(|r| (r.device, r.bearer)).collect();
        assert_eq!(pairs.len(), requests.len());
    }

    #[test]
    fn test_engine_rejection_propagates() {
        let mut controller = FlowAdmissionController::new(AdmissionConfig::default());
        let mut engine = RecordingEngine {
            reject_device: Some(DeviceId(0)),
            ..Default::default()
        };
        let binding = binding();

        let result = controller.admit_slice(
            &mut engine,
            &binding.slices()[0],
            SliceAdmission {
                base_port: 1001,
                sub_flows: 1,
            },
        );
        assert_eq!(
            result.unwrap_err(),
            SlicingError::Engine(EngineError::UnknownDevice(DeviceId(0)))
        );
    }
}
