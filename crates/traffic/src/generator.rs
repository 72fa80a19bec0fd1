//! The generator state machine.

use crate::{TrafficError, TrafficGeneratorConfig};
use slicesim_core::{Action, Event, StateMachine, TimerId};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Lifecycle of a generator. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Idle,
    Running,
    Stopped,
}

/// A constant-bit-rate packet source.
///
/// On `Start` it opens its endpoint and sends one packet immediately; every
/// later packet is sent when the single pending send timer fires. The send
/// period is `packet_size · 8 / data_rate`. `Stop` cancels the pending timer
/// (if any) and closes the endpoint.
pub struct TrafficGenerator {
    config: TrafficGeneratorConfig,

    /// Send period derived from packet size and data rate.
    interval: Duration,

    state: GeneratorState,

    /// Packets sent since `Start`.
    sent: u32,

    /// The one outstanding send timer, if any.
    pending: Option<TimerId>,

    /// Identifier for the next timer. Never reused.
    next_timer: TimerId,

    now: Duration,
}

impl TrafficGenerator {
    /// Build an idle generator.
    ///
    /// # Errors
    ///
    /// Returns a [`TrafficError`] if the configuration cannot produce a
    /// periodic schedule (zero rate, size or budget, or a send interval
    /// shorter than one nanosecond).
    pub fn new(config: TrafficGeneratorConfig) -> Result<Self, TrafficError> {
        config.validate()?;
        let interval = config.interval()?;

        Ok(Self {
            config,
            interval,
            state: GeneratorState::Idle,
            sent: 0,
            pending: None,
            next_timer: TimerId(0),
            now: Duration::ZERO,
        })
    }

    pub fn config(&self) -> &TrafficGeneratorConfig {
        &self.config
    }

    /// Time between consecutive packets.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    /// Packets sent since the generator started.
    pub fn sent(&self) -> u32 {
        self.sent
    }

    /// The outstanding send timer, if any.
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Event handlers
    // ═══════════════════════════════════════════════════════════════════════════

    fn on_start(&mut self) -> Vec<Action> {
        if self.state != GeneratorState::Idle {
            warn!(state = ?self.state, "Ignoring start of a generator that already ran");
            return vec![];
        }

        self.state = GeneratorState::Running;
        self.sent = 0;
        debug!(
            destination = %self.config.destination,
            interval = ?self.interval,
            budget = self.config.packet_budget,
            "Generator started"
        );

        let mut actions = vec![Action::OpenEndpoint];
        actions.extend(self.send_packet());
        actions
    }

    fn on_timer(&mut self, id: TimerId) -> Vec<Action> {
        if self.state != GeneratorState::Running || self.pending != Some(id) {
            trace!(timer = %id, "Ignoring stale send timer");
            return vec![];
        }
        self.pending = None;
        self.send_packet()
    }

    fn on_stop(&mut self) -> Vec<Action> {
        let previous = self.state;
        self.state = GeneratorState::Stopped;

        match previous {
            GeneratorState::Running => {
                let mut actions = Vec::with_capacity(2);
                if let Some(id) = self.pending.take() {
                    actions.push(Action::CancelTimer { id });
                }
                actions.push(Action::CloseEndpoint);
                debug!(sent = self.sent, "Generator stopped");
                actions
            }
            // Never opened an endpoint, or already closed it.
            GeneratorState::Idle | GeneratorState::Stopped => vec![],
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Sending
    // ═══════════════════════════════════════════════════════════════════════════

    fn send_packet(&mut self) -> Vec<Action> {
        let mut actions = vec![Action::Transmit {
            bytes: self.config.packet_size,
        }];
        self.sent += 1;

        if self.sent < self.config.packet_budget {
            actions.extend(self.schedule_tx());
        } else {
            debug!(sent = self.sent, "Packet budget exhausted");
        }
        actions
    }

    fn schedule_tx(&mut self) -> Option<Action> {
        if self.state != GeneratorState::Running {
            return None;
        }
        let id = self.next_timer;
        self.next_timer = id.next();
        self.pending = Some(id);
        Some(Action::SetTimer {
            id,
            after: self.interval,
        })
    }
}

impl StateMachine for TrafficGenerator {
    fn handle(&mut self, event: Event) -> Vec<Action> {
        match event {
            Event::Start => self.on_start(),
            Event::TimerFired(id) => self.on_timer(id),
            Event::Stop => self.on_stop(),
        }
    }

    fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    fn now(&self) -> Duration {
        self.now
    }
}
