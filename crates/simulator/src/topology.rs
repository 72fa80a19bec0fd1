//! Devices taking part in a scenario.
//!
//! One base station, one remote host that sources all downlink traffic, and
//! the user equipments that receive it. Each device carries its role from
//! creation, so nothing downstream has to guess what a device is.

use crate::ConfigError;
use slicesim_types::{DeviceHandle, DeviceId, DeviceRole};
use std::net::{Ipv4Addr, SocketAddrV4};

/// Address of the remote host on the core network side.
pub const REMOTE_HOST_ADDRESS: Ipv4Addr = Ipv4Addr::new(1, 0, 0, 2);

/// Address of the base station.
pub const BASE_STATION_ADDRESS: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

/// Address of the first user equipment. Later ones count up from here.
pub const FIRST_UE_ADDRESS: Ipv4Addr = Ipv4Addr::new(7, 0, 0, 2);

/// First ephemeral port the remote host sends from.
pub const FIRST_SOURCE_PORT: u16 = 49153;

/// Every device of a scenario.
#[derive(Debug, Clone)]
pub struct Topology {
    base_station: DeviceHandle,
    remote_host: DeviceHandle,
    user_equipment: Vec<DeviceHandle>,
}

impl Topology {
    pub fn builder() -> TopologyBuilder {
        TopologyBuilder::default()
    }

    pub fn base_station(&self) -> &DeviceHandle {
        &self.base_station
    }

    pub fn remote_host(&self) -> &DeviceHandle {
        &self.remote_host
    }

    /// User equipments in creation order.
    pub fn user_equipment(&self) -> &[DeviceHandle] {
        &self.user_equipment
    }

    /// Every device, base station and remote host first.
    pub fn devices(&self) -> impl Iterator<Item = DeviceHandle> + '_ {
        [self.base_station, self.remote_host]
            .into_iter()
            .chain(self.user_equipment.iter().copied())
    }

    pub fn device(&self, id: DeviceId) -> Option<&DeviceHandle> {
        [&self.base_station, &self.remote_host]
            .into_iter()
            .chain(self.user_equipment.iter())
            .find(|device| device.id == id)
    }

    /// Remote host endpoint for the `index`-th application, if a port is left.
    pub fn source_endpoint(&self, index: usize) -> Option<SocketAddrV4> {
        let port = u16::try_from(index)
            .ok()
            .and_then(|offset| FIRST_SOURCE_PORT.checked_add(offset))?;
        Some(SocketAddrV4::new(self.remote_host.address, port))
    }
}

/// Builds a [`Topology`].
#[derive(Debug, Default)]
pub struct TopologyBuilder {
    user_equipment: usize,
}

impl TopologyBuilder {
    pub fn with_user_equipment(mut self, count: usize) -> Self {
        self.user_equipment = count;
        self
    }

    /// Create the devices and assign identifiers and addresses.
    pub fn build(self) -> Result<Topology, ConfigError> {
        let first = u32::from(FIRST_UE_ADDRESS);
        // Stay inside 7.0.0.0/8.
        let capacity = (u32::from(Ipv4Addr::new(7, 255, 255, 254)) - first + 1) as usize;
        if self.user_equipment > capacity {
            return Err(ConfigError::TooManyDevices(self.user_equipment));
        }

        let base_station =
            DeviceHandle::new(DeviceId(0), DeviceRole::BaseStation, BASE_STATION_ADDRESS);
        let remote_host =
            DeviceHandle::new(DeviceId(1), DeviceRole::RemoteHost, REMOTE_HOST_ADDRESS);
        let user_equipment = (0..self.user_equipment as u32)
            .map(|i| {
                DeviceHandle::new(
                    DeviceId(2 + i),
                    DeviceRole::UserEquipment,
                    Ipv4Addr::from(first + i),
                )
            })
            .collect();

        Ok(Topology {
            base_station,
            remote_host,
            user_equipment,
        })
    }
}
