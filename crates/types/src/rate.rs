//! Data rates and transmission-time arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// A data rate in bits per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataRate(u64);

/// Error returned when a data rate string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid data rate: {0}")]
pub struct InvalidDataRate(pub String);

impl DataRate {
    /// Create from bits per second.
    pub const fn from_bps(bits_per_sec: u64) -> Self {
        Self(bits_per_sec)
    }

    /// Create from megabits per second.
    pub fn from_mbps(mbps: f64) -> Self {
        Self((mbps * 1e6).round() as u64)
    }

    /// Rate needed to send `packet_size` bytes `packets_per_sec` times a second.
    pub fn from_packet_rate(packet_size: u32, packets_per_sec: u32) -> Self {
        Self(packet_size as u64 * 8 * packets_per_sec as u64)
    }

    /// Get the raw rate.
    pub fn bits_per_sec(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Time needed to transmit `bytes` at this rate.
    ///
    /// Computed in integer nanoseconds, rounded to the nearest nanosecond,
    /// so that periodic schedules do not accumulate floating-point drift.
    /// Returns `None` for a zero rate or when the exact time is shorter than
    /// one nanosecond.
    pub fn tx_time(&self, bytes: u32) -> Option<Duration> {
        let rate = self.0 as u128;
        let bit_nanos = bytes as u128 * 8 * 1_000_000_000;
        if rate == 0 || bit_nanos < rate {
            return None;
        }
        let nanos = (bit_nanos + rate / 2) / rate;
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

impl FromStr for DataRate {
    type Err = InvalidDataRate;

    /// Parse strings like `"1000000"`, `"500kbps"`, `"10Mbps"` or `"1.5Gbps"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_lowercase();
        let (number, scale) = if let Some(n) = lower.strip_suffix("gbps") {
            (n, 1e9)
        } else if let Some(n) = lower.strip_suffix("mbps") {
            (n, 1e6)
        } else if let Some(n) = lower.strip_suffix("kbps") {
            (n, 1e3)
        } else if let Some(n) = lower.strip_suffix("bps") {
            (n, 1.0)
        } else {
            (lower.as_str(), 1.0)
        };

        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| InvalidDataRate(trimmed.to_string()))?;
        if !value.is_finite() || value < 0.0 {
            return Err(InvalidDataRate(trimmed.to_string()));
        }
        Ok(DataRate((value * scale).round() as u64))
    }
}

impl TryFrom<String> for DataRate {
    type Error = InvalidDataRate;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataRate> for String {
    fn from(rate: DataRate) -> Self {
        rate.to_string()
    }
}
