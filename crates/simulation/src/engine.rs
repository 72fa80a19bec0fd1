//! In-process stand-in for the external radio engine.

use indexmap::IndexMap;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use slicesim_core::{EngineError, RadioConfig, RadioEngine};
use slicesim_spectrum::SpectrumPlan;
use slicesim_types::{
    AdmissionRequest, BearerId, DeviceHandle, DeviceId, FiveTuple, FlowFilter, QosClass,
    SegmentId,
};
use std::time::Duration;
use tracing::{debug, info, trace};

/// Fixed transport characteristics of the simulated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Delay added to every packet before the air interface.
    pub link_delay: Duration,
    /// Upper bound of the uniform per-packet jitter.
    pub max_jitter: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            link_delay: Duration::ZERO,
            max_jitter: Duration::from_micros(500),
        }
    }
}

/// Where a classified packet travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub device: DeviceId,
    pub bearer: BearerId,
    pub qos: QosClass,
    pub segment: SegmentId,
}

/// A filter installed on a device bearer.
#[derive(Debug, Clone, Copy)]
struct InstalledFilter {
    device: DeviceId,
    bearer: BearerId,
    qos: QosClass,
    filter: FlowFilter,
}

/// Deterministic reference engine.
///
/// Records the spectrum, QoS routes and bearers it is configured with and
/// classifies downlink packets through the installed filters. Delivery delay
/// is the link delay plus one slot of the carrying segment plus seeded
/// uniform jitter. Packets no filter claims ride the device's default bearer
/// as `NGBR_VIDEO_TCP_DEFAULT`.
pub struct SimulatedEngine {
    link: LinkConfig,
    rng: ChaCha8Rng,
    plan: Option<SpectrumPlan>,
    radio: Option<RadioConfig>,
    devices: IndexMap<DeviceId, DeviceHandle>,
    qos_routes: IndexMap<QosClass, SegmentId>,
    filters: Vec<InstalledFilter>,
}

impl SimulatedEngine {
    pub fn new(link: LinkConfig, seed: u64) -> Self {
        Self {
            link,
            rng: ChaCha8Rng::seed_from_u64(seed),
            plan: None,
            radio: None,
            devices: IndexMap::new(),
            qos_routes: IndexMap::new(),
            filters: Vec::new(),
        }
    }

    /// Attach devices created by the topology.
    pub fn with_devices(mut self, devices: impl IntoIterator<Item = DeviceHandle>) -> Self {
        for device in devices {
            self.attach_device(device);
        }
        self
    }

    pub fn attach_device(&mut self, device: DeviceHandle) {
        trace!(device = %device, "Attached device");
        self.devices.insert(device.id, device);
    }

    pub fn link(&self) -> &LinkConfig {
        &self.link
    }

    pub fn plan(&self) -> Option<&SpectrumPlan> {
        self.plan.as_ref()
    }

    pub fn radio(&self) -> Option<&RadioConfig> {
        self.radio.as_ref()
    }

    /// Segment carrying `qos`, if routed.
    pub fn qos_route(&self, qos: QosClass) -> Option<SegmentId> {
        self.qos_routes.get(&qos).copied()
    }

    /// Number of installed packet filters.
    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Number of distinct dedicated bearers.
    pub fn bearer_count(&self) -> usize {
        let mut bearers: Vec<_> = self.filters.iter().map(|f| (f.device, f.bearer)).collect();
        bearers.sort();
        bearers.dedup();
        bearers.len()
    }

    /// Classify a downlink packet.
    ///
    /// Returns `None` when the spectrum is not configured or the destination
    /// is not a device that holds bearers.
    pub fn classify(&self, tuple: &FiveTuple) -> Option<Route> {
        let plan = self.plan.as_ref()?;
        let device = self
            .devices
            .values()
            .find(|device| device.address == tuple.destination_address)?;
        if !device.role.accepts_bearers() {
            return None;
        }

        let installed = self.filters.iter().find(|installed| {
            installed.device == device.id
                && installed.filter.matches(tuple.destination_port, tuple.protocol)
        });
        let (bearer, qos) = match installed {
            Some(installed) => (installed.bearer, installed.qos),
            None => (BearerId::DEFAULT, QosClass::NgbrVideoTcpDefault),
        };
        let segment = self
            .qos_route(qos)
            .or_else(|| plan.segments().first().map(|segment| segment.id))?;

        Some(Route {
            device: device.id,
            bearer,
            qos,
            segment,
        })
    }

    /// Sample the one-way delay of a packet along `route`.
    pub fn transit_delay(&mut self, route: &Route) -> Duration {
        let slot = self
            .plan
            .as_ref()
            .and_then(|plan| plan.segment(route.segment))
            .map(|segment| segment.slot_duration())
            .unwrap_or_default();

        let jitter = if self.link.max_jitter.is_zero() {
            Duration::ZERO
        } else {
            let max = u64::try_from(self.link.max_jitter.as_nanos()).unwrap_or(u64::MAX);
            Duration::from_nanos(self.rng.gen_range(0..=max))
        };

        self.link.link_delay + slot + jitter
    }

    fn configured_plan(&self) -> Result<&SpectrumPlan, EngineError> {
        self.plan.as_ref().ok_or(EngineError::NotConfigured)
    }
}

impl RadioEngine for SimulatedEngine {
    fn configure_spectrum(
        &mut self,
        plan: &SpectrumPlan,
        radio: &RadioConfig,
    ) -> Result<(), EngineError> {
        if plan.is_empty() {
            return Err(EngineError::Rejected("spectrum plan has no segments".into()));
        }

        for segment in plan.segments() {
            debug!(
                segment = %segment.id,
                center_frequency = segment.center_frequency,
                bandwidth = segment.bandwidth,
                numerology = segment.numerology,
                tx_power_dbm = segment.tx_power_dbm,
                "Configured carrier segment"
            );
        }
        info!(
            segments = plan.len(),
            tdd_pattern = %radio.tdd_pattern,
            beamforming = ?radio.beamforming,
            full_buffer = radio.full_buffer,
            "Spectrum configured"
        );

        self.plan = Some(plan.clone());
        self.radio = Some(radio.clone());
        self.qos_routes.clear();
        self.filters.clear();
        Ok(())
    }

    fn route_qos(&mut self, qos: QosClass, segment: SegmentId) -> Result<(), EngineError> {
        if self.configured_plan()?.segment(segment).is_none() {
            return Err(EngineError::UnknownSegment(segment));
        }
        debug!(qos = %qos, segment = %segment, "Routed QoS class");
        self.qos_routes.insert(qos, segment);
        Ok(())
    }

    fn activate_dedicated_bearer(
        &mut self,
        request: &AdmissionRequest,
    ) -> Result<(), EngineError> {
        self.configured_plan()?;
        match self.devices.get(&request.device) {
            Some(device) if device.role.accepts_bearers() => {}
            _ => return Err(EngineError::UnknownDevice(request.device)),
        }

        let clash = self.filters.iter().any(|installed| {
            installed.device == request.device && installed.filter.overlaps(&request.filter)
        });
        if clash {
            return Err(EngineError::Rejected(format!(
                "filter for port {} overlaps an installed filter on {}",
                request.filter.local_port_start, request.device
            )));
        }

        self.filters.push(InstalledFilter {
            device: request.device,
            bearer: request.bearer,
            qos: request.qos,
            filter: request.filter,
        });
        Ok(())
    }
}
