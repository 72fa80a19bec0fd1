//! Generator configuration and its validation.

use slicesim_types::{DataRate, Protocol};
use std::net::SocketAddrV4;
use std::time::Duration;
use thiserror::Error;

/// Configuration rejected before a generator is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrafficError {
    /// A zero data rate would make the send interval infinite.
    #[error("Data rate must be positive")]
    ZeroDataRate,

    #[error("Packet size must be positive")]
    ZeroPacketSize,

    #[error("Packet budget must be positive")]
    ZeroBudget,

    /// The send interval would be shorter than the clock resolution.
    #[error("Sending {packet_size}-byte packets at {data_rate} needs an interval below 1ns")]
    IntervalTooShort {
        packet_size: u32,
        data_rate: DataRate,
    },
}

/// Configuration of one rate-paced packet source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficGeneratorConfig {
    /// Peer the endpoint connects to.
    pub destination: SocketAddrV4,
    /// Transport used by the endpoint.
    pub protocol: Protocol,
    /// Payload size of every packet in bytes.
    pub packet_size: u32,
    /// Packets to send before going quiet.
    pub packet_budget: u32,
    /// Target sending rate.
    pub data_rate: DataRate,
}

impl TrafficGeneratorConfig {
    /// Create a UDP configuration with an unlimited packet budget.
    pub fn new(destination: SocketAddrV4, packet_size: u32, data_rate: DataRate) -> Self {
        Self {
            destination,
            protocol: Protocol::Udp,
            packet_size,
            packet_budget: u32::MAX,
            data_rate,
        }
    }

    /// Set the packet budget.
    pub fn with_packet_budget(mut self, packet_budget: u32) -> Self {
        self.packet_budget = packet_budget;
        self
    }

    /// Set the transport protocol.
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Reject configurations that cannot produce a periodic schedule.
    pub fn validate(&self) -> Result<(), TrafficError> {
        if self.data_rate.is_zero() {
            return Err(TrafficError::ZeroDataRate);
        }
        if self.packet_size == 0 {
            return Err(TrafficError::ZeroPacketSize);
        }
        if self.packet_budget == 0 {
            return Err(TrafficError::ZeroBudget);
        }
        self.interval().map(|_| ())
    }

    /// Send period `packet_size · 8 / data_rate`.
    pub(crate) fn interval(&self) -> Result<Duration, TrafficError> {
        if self.data_rate.is_zero() {
            return Err(TrafficError::ZeroDataRate);
        }
        self.data_rate
            .tx_time(self.packet_size)
            .ok_or(TrafficError::IntervalTooShort {
                packet_size: self.packet_size,
                data_rate: self.data_rate,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn destination() -> SocketAddrV4 {
        SocketAddrV4::new(Ipv4Addr::new(7, 0, 0, 2), 1001)
    }

    #[test]
    fn test_validate_accepts_sane_config() {
        let config = TrafficGeneratorConfig::new(destination(), 1040, DataRate::from_bps(1_000_000))
            .with_packet_budget(1000);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_zero_rate() {
        let config = TrafficGeneratorConfig::new(destination(), 1040, DataRate::from_bps(0));
        assert_eq!(config.validate(), Err(TrafficError::ZeroDataRate));
    }

    #[test]
    fn test_validate_rejects_zero_size_and_budget() {
        let rate = DataRate::from_bps(1_000_000);
        let config = TrafficGeneratorConfig::new(destination(), 0, rate);
        assert_eq!(config.validate(), Err(TrafficError::ZeroPacketSize));

        let config = TrafficGeneratorConfig::new(destination(), 1040, rate).with_packet_budget(0);
        assert_eq!(config.validate(), Err(TrafficError::ZeroBudget));
    }

    #[test]
    fn test_validate_rejects_sub_nanosecond_interval() {
        let rate = DataRate::from_bps(10_000_000_000);
        let config = TrafficGeneratorConfig::new(destination(), 1, rate);
        assert_eq!(
            config.validate(),
            Err(TrafficError::IntervalTooShort {
                packet_size: 1,
                data_rate: rate,
            })
        );
    }
}
