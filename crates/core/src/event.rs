//! Inbound events delivered to state machines by the runner.

use std::fmt;

/// Identifier of a one-shot timer owned by a single state machine.
///
/// Timer identifiers are never reused by the same owner, so a timer that
/// fires after it was superseded can be recognised and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

impl TimerId {
    /// Get the next timer identifier.
    pub fn next(self) -> Self {
        TimerId(self.0 + 1)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Events processed by application state machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The application's start time has been reached.
    Start,

    /// The application's stop time has been reached.
    Stop,

    /// A timer set through [`crate::Action::SetTimer`] expired.
    TimerFired(TimerId),
}

impl Event {
    /// Get a human-readable name for this event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::Start => "Start",
            Event::Stop => "Stop",
            Event::TimerFired(_) => "TimerFired",
        }
    }
}
