//! The event loop.

use crate::{EventQueue, FlowMonitor, SimEvent, SimulatedEngine};
use slicesim_core::{Action, Event, StateMachine, TimerId};
use slicesim_stats::FlowRecord;
use slicesim_traffic::TrafficGenerator;
use slicesim_types::{FiveTuple, FlowId};
use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddrV4;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Index of an application installed on the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppId(pub usize);

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "app-{}", self.0)
    }
}

/// Counters collected while the loop runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationStats {
    pub events_processed: u64,
    pub packets_transmitted: u64,
    pub packets_delivered: u64,
    /// Packets the engine could not classify or that would arrive after the
    /// run ends.
    pub packets_dropped: u64,
    pub timers_cancelled: u64,
}

struct Application {
    generator: TrafficGenerator,
    /// Addressing of every packet the generator sends.
    tuple: FiveTuple,
    endpoint_open: bool,
    /// Pending timers, so a cancellation removes exactly this app's event.
    timers: HashMap<TimerId, crate::EventKey>,
}

/// Deterministic single-threaded runner.
///
/// Owns the virtual clock, the event queue, every installed generator and the
/// engine. Generators never see the queue: the runner turns their actions
/// into scheduled events and packets.
pub struct SimulationRunner {
    engine: SimulatedEngine,
    monitor: FlowMonitor,
    queue: EventQueue,
    applications: Vec<Application>,
    now: Duration,
    /// Virtual time at which the current run stops.
    end: Duration,
    stats: SimulationStats,
}

impl SimulationRunner {
    /// Create a runner around an engine that has already been configured.
    pub fn new(engine: SimulatedEngine) -> Self {
        Self {
            engine,
            monitor: FlowMonitor::new(),
            queue: EventQueue::new(),
            applications: Vec::new(),
            now: Duration::ZERO,
            end: Duration::ZERO,
            stats: SimulationStats::default(),
        }
    }

    /// Install a generator sending from `source`.
    pub fn add_application(&mut self, generator: TrafficGenerator, source: SocketAddrV4) -> AppId {
        let config = generator.config();
        let tuple = FiveTuple {
            source_address: *source.ip(),
            source_port: source.port(),
            destination_address: *config.destination.ip(),
            destination_port: config.destination.port(),
            protocol: config.protocol,
        };
        let id = AppId(self.applications.len());
        debug!(app = %id, %tuple, "Installed application");

        self.applications.push(Application {
            generator,
            tuple,
            endpoint_open: false,
            timers: HashMap::new(),
        });
        id
    }

    /// Deliver `Start` to `app` at `at`.
    pub fn schedule_start(&mut self, app: AppId, at: Duration) {
        self.queue.schedule(
            at,
            SimEvent::Application {
                app,
                event: Event::Start,
            },
        );
    }

    /// Deliver `Stop` to `app` at `at`.
    pub fn schedule_stop(&mut self, app: AppId, at: Duration) {
        self.queue.schedule(
            at,
            SimEvent::Application {
                app,
                event: Event::Stop,
            },
        );
    }

    /// Process every event due no later than `end`, then leave the clock at
    /// `end`. Events scheduled later stay queued.
    pub fn run_until(&mut self, end: Duration) {
        self.end = end;
        info!(end = ?end, applications = self.applications.len(), "Simulation started");

        while let Some((key, event)) = self.queue.pop_until(end) {
            self.now = key.time;
            self.stats.events_processed += 1;
            self.process(key, event);
        }
        self.now = self.now.max(end);

        info!(
            events = self.stats.events_processed,
            transmitted = self.stats.packets_transmitted,
            delivered = self.stats.packets_delivered,
            dropped = self.stats.packets_dropped,
            "Simulation finished"
        );
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn engine(&self) -> &SimulatedEngine {
        &self.engine
    }

    pub fn monitor(&self) -> &FlowMonitor {
        &self.monitor
    }

    pub fn generator(&self, app: AppId) -> Option<&TrafficGenerator> {
        self.applications.get(app.0).map(|a| &a.generator)
    }

    /// Snapshot of every flow record, in flow-id order.
    pub fn flow_records(&self) -> Vec<FlowRecord> {
        self.monitor.records().copied().collect()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Event dispatch
    // ═══════════════════════════════════════════════════════════════════════

    fn process(&mut self, key: crate::EventKey, event: SimEvent) {
        match event {
            SimEvent::Application { app, event } => {
                let Some(application) = self.applications.get_mut(app.0) else {
                    warn!(app = %app, "Event for unknown application");
                    return;
                };
                if let Event::TimerFired(id) = event {
                    if application.timers.get(&id) == Some(&key) {
                        application.timers.remove(&id);
                    }
                }

                trace!(app = %app, event = event.type_name(), time = ?self.now, "Dispatch");
                let actions = application.generator.step(self.now, event);
                for action in actions {
                    self.execute(app, action);
                }
            }
            SimEvent::Deliver {
                flow,
                bytes,
                sent_at,
            } => {
                self.stats.packets_delivered += 1;
                self.monitor.record_rx(flow, bytes, sent_at, self.now);
            }
        }
    }

    fn execute(&mut self, app: AppId, action: Action) {
        let now = self.now;
        let Some(application) = self.applications.get_mut(app.0) else {
            return;
        };

        match action {
            Action::OpenEndpoint => {
                application.endpoint_open = true;
                trace!(app = %app, tuple = %application.tuple, "Endpoint open");
            }
            Action::CloseEndpoint => {
                application.endpoint_open = false;
                trace!(app = %app, "Endpoint closed");
            }
            Action::SetTimer { id, after } => {
                let key = self.queue.schedule(
                    now + after,
                    SimEvent::Application {
                        app,
                        event: Event::TimerFired(id),
                    },
                );
                application.timers.insert(id, key);
            }
            Action::CancelTimer { id } => {
                if let Some(key) = application.timers.remove(&id) {
                    if self.queue.cancel(key).is_some() {
                        self.stats.timers_cancelled += 1;
                    }
                }
            }
            Action::Transmit { bytes } => {
                if !application.endpoint_open {
                    warn!(app = %app, "Transmit on a closed endpoint");
                    return;
                }
                let tuple = application.tuple;
                self.transmit(tuple, bytes);
            }
        }
    }

    fn transmit(&mut self, tuple: FiveTuple, bytes: u32) {
        self.stats.packets_transmitted += 1;
        let flow = self.monitor.record_tx(tuple, bytes, self.now);

        let Some(route) = self.engine.classify(&tuple) else {
            self.drop_packet(flow, "unclassified");
            return;
        };
        let arrival = self.now + self.engine.transit_delay(&route);
        if arrival > self.end {
            self.drop_packet(flow, "arrives after end of run");
            return;
        }

        self.queue.schedule(
            arrival,
            SimEvent::Deliver {
                flow,
                bytes,
                sent_at: self.now,
            },
        );
    }

    fn drop_packet(&mut self, flow: FlowId, reason: &'static str) {
        self.stats.packets_dropped += 1;
        trace!(flow = %flow, reason, "Dropped packet");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LinkConfig;
    use slicesim_core::{RadioConfig, RadioEngine};
    use slicesim_spectrum::{BandDefinition, SegmentDefinition, SpectrumPlan};
    use slicesim_traffic::{GeneratorState, TrafficGeneratorConfig};
    use slicesim_types::{
        AdmissionRequest, BearerId, DataRate, DeviceHandle, DeviceId, DeviceRole, FlowFilter,
        Protocol, QosClass, SegmentId, SliceId,
    };
    use std::net::Ipv4Addr;
    use tracing_test::traced_test;

    const UE_ADDRESS: Ipv4Addr = Ipv4Addr::new(7, 0, 0, 2);
    const HOST: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(1, 0, 0, 2), 49153);

    fn configured_engine(link: LinkConfig) -> SimulatedEngine {
        let mut engine = SimulatedEngine::new(link, 42).with_devices([DeviceHandle::new(
            DeviceId(1),
            DeviceRole::UserEquipment,
            UE_ADDRESS,
        )]);
        let plan = SpectrumPlan::build(
            &BandDefinition {
                center_frequency: 28e9,
                bandwidth: 3e9,
            },
            &[SegmentDefinition {
                center_frequency: 28e9,
                bandwidth: 400e6,
                numerology: 3,
            }],
            8.0,
        );
        engine.configure_spectrum(&plan, &RadioConfig::default()).unwrap();
        engine.route_qos(QosClass::GbrGaming, SegmentId(0)).unwrap();
        engine
            .activate_dedicated_bearer(&AdmissionRequest {
                device: DeviceId(1),
                bearer: BearerId(2),
                qos: QosClass::GbrGaming,
                filter: FlowFilter::point(FlowId(1), 1001, Protocol::Udp, SliceId(0)),
            })
            .unwrap();
        engine
    }

    fn fixed_link() -> LinkConfig {
        LinkConfig {
            link_delay: Duration::from_millis(1),
            max_jitter: Duration::ZERO,
        }
    }

    fn cbr_generator(budget: u32) -> TrafficGenerator {
        let config = TrafficGeneratorConfig::new(
            SocketAddrV4::new(UE_ADDRESS, 1001),
            1040,
            DataRate::from_bps(1_000_000),
        )
        .with_packet_budget(budget);
        TrafficGenerator::new(config).unwrap()
    }

    #[test]
    fn test_budget_limits_packets_and_spacing() {
        let mut runner = SimulationRunner::new(configured_engine(fixed_link()));
        let app = runner.add_application(cbr_generator(1000), HOST);
        runner.schedule_start(app, Duration::ZERO);
        runner.schedule_stop(app, Duration::from_secs(20));
        runner.run_until(Duration::from_secs(30));

        let records = runner.flow_records();
        assert_eq!(records.len(), 1);
        let record = records[0];
        assert_eq!(record.tx_packets, 1000);
        assert_eq!(record.rx_packets, 1000);
        assert_eq!(record.first_tx, Duration::ZERO);

        // 999 periods of 8.32 ms, plus 1 ms link and a 125 us slot.
        let delay = Duration::from_millis(1) + Duration::from_micros(125);
        assert_eq!(record.last_rx, Duration::from_micros(999 * 8320) + delay);
        assert_eq!(record.delay_sum, delay * 1000);
        assert_eq!(record.jitter_sum, Duration::ZERO);
        assert_eq!(
            runner.generator(app).map(|g| g.state()),
            Some(GeneratorState::Stopped)
        );
    }

    #[test]
    fn test_stop_prevents_further_sends() {
        let mut runner = SimulationRunner::new(configured_engine(fixed_link()));
        let app = runner.add_application(cbr_generator(1000), HOST);
        runner.schedule_start(app, Duration::ZERO);
        // Sends at 0, 8.32, ..., 99.84 ms: 13 packets before the stop.
        runner.schedule_stop(app, Duration::from_millis(100));
        runner.run_until(Duration::from_secs(1));

        let record = runner.flow_records()[0];
        assert_eq!(record.tx_packets, 13);
        assert_eq!(runner.generator(app).unwrap().sent(), 13);
        assert_eq!(runner.stats().timers_cancelled, 1);
        assert!(runner.engine().plan().is_some());
    }

    #[test]
    fn test_nanosecond_pacing_reaches_stop() {
        let config = TrafficGeneratorConfig::new(
            SocketAddrV4::new(UE_ADDRESS, 1001),
            1,
            DataRate::from_bps(3_000_000_000),
        )
        .with_packet_budget(100_000);
        let mut runner = SimulationRunner::new(configured_engine(fixed_link()));
        let app = runner.add_application(TrafficGenerator::new(config).unwrap(), HOST);
        runner.schedule_start(app, Duration::ZERO);
        // Sends every 3 ns at 0, 3, ..., 99 ns.
        runner.schedule_stop(app, Duration::from_nanos(100));
        runner.run_until(Duration::from_millis(1));

        assert_eq!(runner.generator(app).unwrap().sent(), 34);
        assert_eq!(runner.flow_records()[0].tx_packets, 34);
        assert_eq!(runner.stats().timers_cancelled, 1);
    }

    #[test]
    fn test_late_arrivals_are_dropped() {
        let mut runner = SimulationRunner::new(configured_engine(fixed_link()));
        let app = runner.add_application(cbr_generator(1000), HOST);
        runner.schedule_start(app, Duration::ZERO);
        runner.run_until(Duration::from_millis(100));

        let record = runner.flow_records()[0];
        // The packet sent at 99.84 ms would arrive after 100 ms.
        assert_eq!(record.tx_packets, 13);
        assert_eq!(record.rx_packets, 12);
        assert_eq!(runner.stats().packets_dropped, 1);
        assert_eq!(runner.now(), Duration::from_millis(100));
    }

    #[test]
    fn test_same_time_events_run_in_schedule_order() {
        let mut runner = SimulationRunner::new(configured_engine(fixed_link()));
        let first = runner.add_application(cbr_generator(1), SocketAddrV4::new(*HOST.ip(), 49153));
        let mut config = *cbr_generator(1).config();
        config.destination = SocketAddrV4::new(UE_ADDRESS, 1002);
        let second = runner.add_application(
            TrafficGenerator::new(config).unwrap(),
            SocketAddrV4::new(*HOST.ip(), 49154),
        );

        runner.schedule_start(second, Duration::from_millis(5));
        runner.schedule_start(first, Duration::from_millis(5));
        runner.run_until(Duration::from_secs(1));

        let ports: Vec<_> = runner
            .flow_records()
            .iter()
            .map(|r| r.tuple.destination_port)
            .collect();
        assert_eq!(ports, vec![1002, 1001]);
    }

    #[test]
    #[traced_test]
    fn test_unclassified_traffic_is_dropped() {
        let engine = SimulatedEngine::new(fixed_link(), 1);
        let mut runner = SimulationRunner::new(engine);
        let app = runner.add_application(cbr_generator(5), HOST);
        runner.schedule_start(app, Duration::ZERO);
        runner.run_until(Duration::from_secs(1));

        let record = runner.flow_records()[0];
        assert_eq!(record.tx_packets, 5);
        assert_eq!(record.rx_packets, 0);
        assert_eq!(runner.stats().packets_dropped, 5);
        assert!(logs_contain("Simulation finished"));
    }
}
