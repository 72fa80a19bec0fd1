//! Traffic classes and the QoS classes that carry them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Traffic class served by one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrafficClass {
    /// Interactive (XR) video streamed to a headset.
    InteractiveVideo,
    /// Rendered game frames streamed from a cloud server.
    CloudGaming,
    /// Control traffic for connected vehicles.
    VehicularControl,
}

impl TrafficClass {
    /// All classes, in their default slice order.
    pub const ALL: [TrafficClass; 3] = [
        TrafficClass::InteractiveVideo,
        TrafficClass::CloudGaming,
        TrafficClass::VehicularControl,
    ];

    /// Get a human-readable name for this class.
    pub fn name(&self) -> &'static str {
        match self {
            TrafficClass::InteractiveVideo => "interactive-video",
            TrafficClass::CloudGaming => "cloud-gaming",
            TrafficClass::VehicularControl => "vehicular-control",
        }
    }

    /// The QoS class requested for every flow of this traffic class.
    pub fn qos_class(&self) -> QosClass {
        match self {
            TrafficClass::InteractiveVideo => QosClass::NgbrVideoTcpDefault,
            TrafficClass::CloudGaming => QosClass::GbrGaming,
            TrafficClass::VehicularControl => QosClass::NgbrV2x,
        }
    }
}

impl fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown traffic class name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown traffic class: {0}")]
pub struct UnknownTrafficClass(pub String);

impl FromStr for TrafficClass {
    type Err = UnknownTrafficClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "interactive-video" | "video" | "vr" => Ok(TrafficClass::InteractiveVideo),
            "cloud-gaming" | "gaming" | "cg" => Ok(TrafficClass::CloudGaming),
            "vehicular-control" | "v2x" | "ad" => Ok(TrafficClass::VehicularControl),
            _ => Err(UnknownTrafficClass(s.to_string())),
        }
    }
}

/// Bearer QoS class, named after the 3GPP standardized 5QI table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QosClass {
    /// Guaranteed bitrate, conversational voice.
    GbrConvVoice,
    /// Guaranteed bitrate, real-time gaming.
    GbrGaming,
    /// Guaranteed bitrate, vehicle-to-everything messages.
    GbrV2x,
    /// Non-guaranteed bitrate, voice/video/interactive gaming.
    NgbrVoiceVideoGaming,
    /// Non-guaranteed bitrate, buffered video and TCP traffic.
    NgbrVideoTcpDefault,
    /// Non-guaranteed bitrate, vehicle-to-everything messages.
    NgbrV2x,
}

impl QosClass {
    /// The standardized 5QI value.
    pub fn qi(&self) -> u8 {
        match self {
            QosClass::GbrConvVoice => 1,
            QosClass::GbrGaming => 3,
            QosClass::GbrV2x => 75,
            QosClass::NgbrVoiceVideoGaming => 7,
            QosClass::NgbrVideoTcpDefault => 9,
            QosClass::NgbrV2x => 79,
        }
    }

    /// Whether bearers of this class reserve a guaranteed bitrate.
    pub fn is_gbr(&self) -> bool {
        matches!(
            self,
            QosClass::GbrConvVoice | QosClass::GbrGaming | QosClass::GbrV2x
        )
    }

    /// Get the engine-facing name for this class.
    pub fn name(&self) -> &'static str {
        match self {
            QosClass::GbrConvVoice => "GBR_CONV_VOICE",
            QosClass::GbrGaming => "GBR_GAMING",
            QosClass::GbrV2x => "GBR_V2X",
            QosClass::NgbrVoiceVideoGaming => "NGBR_VOICE_VIDEO_GAMING",
            QosClass::NgbrVideoTcpDefault => "NGBR_VIDEO_TCP_DEFAULT",
            QosClass::NgbrV2x => "NGBR_V2X",
        }
    }
}

impl fmt::Display for QosClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
