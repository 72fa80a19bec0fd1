//! Time-ordered event queue.

use crate::AppId;
use slicesim_core::Event;
use slicesim_types::FlowId;
use std::collections::BTreeMap;
use std::time::Duration;

/// Ordering key for scheduled events.
///
/// Events are ordered by virtual time first and by scheduling order second,
/// so events sharing a timestamp run first-in first-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    pub time: Duration,
    pub sequence: u64,
}

/// Something that happens at a point in virtual time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// Deliver an event to one application.
    Application { app: AppId, event: Event },

    /// A packet of `flow` reaches its receiver.
    Deliver {
        flow: FlowId,
        bytes: u32,
        sent_at: Duration,
    },
}

/// Pending events in execution order.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: BTreeMap<EventKey, SimEvent>,
    next_sequence: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` at `time` and return the key that can cancel it.
    pub fn schedule(&mut self, time: Duration, event: SimEvent) -> EventKey {
        let key = EventKey {
            time,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.events.insert(key, event);
        key
    }

    /// Remove a scheduled event. Returns `None` if it already ran or was
    /// cancelled before.
    pub fn cancel(&mut self, key: EventKey) -> Option<SimEvent> {
        self.events.remove(&key)
    }

    /// Take the earliest event if it is due no later than `deadline`.
    pub fn pop_until(&mut self, deadline: Duration) -> Option<(EventKey, SimEvent)> {
        let entry = self.events.first_entry()?;
        if entry.key().time > deadline {
            return None;
        }
        let key = *entry.key();
        Some((key, entry.remove()))
    }

    /// Time of the earliest pending event.
    pub fn next_time(&self) -> Option<Duration> {
        self.events.keys().next().map(|key| key.time)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
