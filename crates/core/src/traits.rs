//! The application state machine trait.

use crate::{Action, Event};
use std::time::Duration;

/// An application driven by a runner that owns the virtual clock.
///
/// Implementations never touch sockets or timers themselves. They react to
/// one [`Event`] at a time and describe the side effects they want as
/// [`Action`]s; the runner executes them in order. Given the same state,
/// time and event an implementation must return the same actions.
pub trait StateMachine {
    /// React to `event` at the time last passed to [`set_time`](Self::set_time).
    fn handle(&mut self, event: Event) -> Vec<Action>;

    /// Advance the machine's notion of the current virtual time.
    fn set_time(&mut self, now: Duration);

    /// The virtual time last set.
    fn now(&self) -> Duration;

    /// Set the time to `now` and handle `event`.
    fn step(&mut self, now: Duration, event: Event) -> Vec<Action> {
        self.set_time(now);
        self.handle(event)
    }
}
