//! Outbound actions requested by state machines.

use crate::TimerId;
use std::time::Duration;

/// Side effects a state machine asks its runner to perform.
///
/// The runner executes actions in the order they are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // ═══════════════════════════════════════════════════════════════════════
    // Transport endpoint
    // ═══════════════════════════════════════════════════════════════════════
    /// Bind the local endpoint and connect it to the configured peer.
    OpenEndpoint,

    /// Send one packet of `bytes` bytes on the connected endpoint.
    Transmit { bytes: u32 },

    /// Close the endpoint. No further transmissions follow.
    CloseEndpoint,

    // ═══════════════════════════════════════════════════════════════════════
    // Timers
    // ═══════════════════════════════════════════════════════════════════════
    /// Fire `TimerFired(id)` after `after` of virtual time.
    SetTimer { id: TimerId, after: Duration },

    /// Cancel a pending timer. Cancelling an unknown timer is a no-op.
    CancelTimer { id: TimerId },
}

impl Action {
    /// Get a human-readable name for this action type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::OpenEndpoint => "OpenEndpoint",
            Action::Transmit { .. } => "Transmit",
            Action::CloseEndpoint => "CloseEndpoint",
            Action::SetTimer { .. } => "SetTimer",
            Action::CancelTimer { .. } => "CancelTimer",
        }
    }
}
