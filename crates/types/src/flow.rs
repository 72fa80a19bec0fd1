//! Flow classification types: protocols, five-tuples, packet filters and
//! admission requests.

use crate::{BearerId, DeviceId, FlowId, QosClass, SliceId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Transport protocol of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Protocol {
    Tcp,
    Udp,
    /// Any other IP protocol, kept as its numeric code.
    Other(u8),
}

impl Protocol {
    /// IP protocol number.
    pub fn number(&self) -> u8 {
        match self {
            Protocol::Tcp => 6,
            Protocol::Udp => 17,
            Protocol::Other(n) => *n,
        }
    }

    /// Build from an IP protocol number.
    pub fn from_number(n: u8) -> Self {
        match n {
            6 => Protocol::Tcp,
            17 => Protocol::Udp,
            n => Protocol::Other(n),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => f.write_str("TCP"),
            Protocol::Udp => f.write_str("UDP"),
            Protocol::Other(n) => write!(f, "{}", n),
        }
    }
}

/// Error returned when parsing an unknown protocol name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown protocol: {0}")]
pub struct UnknownProtocol(pub String);

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => other
                .parse::<u8>()
                .map(Protocol::from_number)
                .map_err(|_| UnknownProtocol(s.to_string())),
        }
    }
}

impl TryFrom<String> for Protocol {
    type Error = UnknownProtocol;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Protocol> for String {
    fn from(protocol: Protocol) -> Self {
        protocol.to_string()
    }
}

/// Source/destination addressing of one classified flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FiveTuple {
    pub source_address: Ipv4Addr,
    pub source_port: u16,
    pub destination_address: Ipv4Addr,
    pub destination_port: u16,
    pub protocol: Protocol,
}

impl fmt::Display for FiveTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{}",
            self.source_address, self.source_port, self.destination_address, self.destination_port
        )
    }
}

/// Downlink packet filter keyed on the receiving device's local port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowFilter {
    /// Admission-order identifier of the flow this filter routes.
    pub flow: FlowId,
    /// First local port matched (inclusive).
    pub local_port_start: u16,
    /// Last local port matched (inclusive).
    pub local_port_end: u16,
    /// Protocol matched.
    pub protocol: Protocol,
    /// Slice owning the flow.
    pub slice: SliceId,
}

impl FlowFilter {
    /// Create a filter matching exactly one local port.
    pub fn point(flow: FlowId, port: u16, protocol: Protocol, slice: SliceId) -> Self {
        Self {
            flow,
            local_port_start: port,
            local_port_end: port,
            protocol,
            slice,
        }
    }

    /// Check whether a packet to `port` over `protocol` matches this filter.
    pub fn matches(&self, port: u16, protocol: Protocol) -> bool {
        self.protocol == protocol && (self.local_port_start..=self.local_port_end).contains(&port)
    }

    /// Check whether two filters could claim the same packet.
    pub fn overlaps(&self, other: &FlowFilter) -> bool {
        self.protocol == other.protocol
            && self.local_port_start <= other.local_port_end
            && other.local_port_start <= self.local_port_end
    }
}

/// Request to the engine to admit one flow onto a dedicated bearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionRequest {
    /// Receiving device.
    pub device: DeviceId,
    /// Bearer the filter is attached to (device-scoped).
    pub bearer: BearerId,
    /// QoS class of the bearer.
    pub qos: QosClass,
    /// Packet filter routing the flow onto the bearer.
    pub filter: FlowFilter,
}
