//! Device handles tagged with their role at creation time.

use crate::DeviceId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// The role a device plays in the radio scenario.
///
/// Roles are fixed when the device is created, so nothing downstream has to
/// inspect the engine's device objects to learn what a device is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceRole {
    /// Radio base station serving all slices.
    BaseStation,
    /// User equipment; the only role that holds dedicated bearers.
    UserEquipment,
    /// Wired host behind the core network that sources downlink traffic.
    RemoteHost,
}

impl DeviceRole {
    /// Get a human-readable name for this role.
    pub fn name(&self) -> &'static str {
        match self {
            DeviceRole::BaseStation => "base-station",
            DeviceRole::UserEquipment => "user-equipment",
            DeviceRole::RemoteHost => "remote-host",
        }
    }

    /// Whether devices of this role can be admitted onto a slice.
    pub fn accepts_bearers(&self) -> bool {
        matches!(self, DeviceRole::UserEquipment)
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A device created by the scenario topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceHandle {
    /// Unique device identifier.
    pub id: DeviceId,
    /// Role assigned at creation.
    pub role: DeviceRole,
    /// IPv4 address of the device's data-plane interface.
    pub address: Ipv4Addr,
}

impl DeviceHandle {
    /// Create a new device handle.
    pub fn new(id: DeviceId, role: DeviceRole, address: Ipv4Addr) -> Self {
        Self { id, role, address }
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} {}]", self.id, self.role, self.address)
    }
}
