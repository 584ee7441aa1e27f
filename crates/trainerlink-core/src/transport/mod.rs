//! Sensor discovery and transport.
//!
//! Every way of reaching sensors implements [`SensorTransport`]: list the
//! devices in range, connect one, and receive its readings as a stream of
//! [`SensorReading`]s. Two implementations ship:
//!
//! - [`FixedTransport`]: a fixed catalog of well-known devices with synthetic
//!   readings. Used for demos, tests, and as the discovery fallback.
//! - [`HttpTransport`]: the local device service (see `trainerlink-server`).

pub mod fixed;
pub mod http;

pub use fixed::{FixedTransport, SyntheticSensor, fixed_catalog};
pub use http::HttpTransport;

use log::warn;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{ConnectionError, DiscoveryError};
use crate::metric::{MetricKind, SensorReading};

/// Buffered readings per connected device before the producer blocks.
pub const SAMPLE_STREAM_CAPACITY: usize = 64;

/// Readings from one connected device, one item per device reading.
/// Dropping it disconnects the producer.
pub type SampleStream = mpsc::Receiver<SensorReading>;

/// Role a device can be bound to on the device page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceRole {
    Trainer,
    HeartRate,
    Cadence,
    Speed,
    Power,
}

impl DeviceRole {
    pub const ALL: [DeviceRole; 5] = [
        Self::Trainer,
        Self::HeartRate,
        Self::Cadence,
        Self::Speed,
        Self::Power,
    ];

    /// Metrics a device in this role reports.
    pub fn metrics(self) -> &'static [MetricKind] {
        match self {
            Self::Trainer => &[MetricKind::Power, MetricKind::Cadence, MetricKind::Speed],
            Self::HeartRate => &[MetricKind::HeartRate],
            Self::Cadence => &[MetricKind::Cadence],
            Self::Speed => &[MetricKind::Speed],
            Self::Power => &[MetricKind::Power],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Trainer => "Trainer",
            Self::HeartRate => "Heart rate",
            Self::Cadence => "Cadence",
            Self::Speed => "Speed",
            Self::Power => "Power",
        }
    }
}

impl std::fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trainer => write!(f, "trainer"),
            Self::HeartRate => write!(f, "heartRate"),
            Self::Cadence => write!(f, "cadence"),
            Self::Speed => write!(f, "speed"),
            Self::Power => write!(f, "power"),
        }
    }
}

impl std::str::FromStr for DeviceRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trainer" => Ok(Self::Trainer),
            "heartrate" | "heart_rate" | "hr" => Ok(Self::HeartRate),
            "cadence" => Ok(Self::Cadence),
            "speed" => Ok(Self::Speed),
            "power" => Ok(Self::Power),
            other => Err(format!("unknown device role '{other}'")),
        }
    }
}

fn unknown_device_name() -> String {
    "Unknown device".to_string()
}

/// A discovered sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(default = "unknown_device_name")]
    pub name: String,
    pub address: String,
    pub role: DeviceRole,
}

impl Device {
    pub fn new(name: impl Into<String>, address: impl Into<String>, role: DeviceRole) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            role,
        }
    }
}

/// Anything that can find sensors and stream their readings.
pub trait SensorTransport: Send + Sync {
    /// Short identifier for logs and notices.
    fn name(&self) -> &'static str;

    /// Enumerate devices currently in range.
    fn list_available_devices(&self) -> Result<Vec<Device>, DiscoveryError>;

    /// Connect a device and start streaming its readings.
    fn connect(&self, device: &Device) -> Result<SampleStream, ConnectionError>;

    /// Release whatever link `connect` established.
    fn disconnect(&self) -> Result<(), ConnectionError> {
        Ok(())
    }
}

/// Result of a discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub devices: Vec<Device>,
    /// Soft notice shown when the fallback catalog stood in.
    pub notice: Option<String>,
}

impl Discovery {
    pub fn used_fallback(&self) -> bool {
        self.notice.is_some()
    }

    pub fn by_role(&self, role: DeviceRole) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(move |d| d.role == role)
    }

    pub fn find(&self, address: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.address.eq_ignore_ascii_case(address))
    }
}

/// List devices from `primary`, substituting `fallback` when it fails or finds nothing.
pub fn discover_devices(
    primary: &dyn SensorTransport,
    fallback: &dyn SensorTransport,
) -> Result<Discovery, DiscoveryError> {
    let notice = match primary.list_available_devices() {
        Ok(devices) if !devices.is_empty() => {
            return Ok(Discovery {
                devices,
                notice: None,
            });
        }
        Ok(_) => format!("No devices found via {}, showing fallback devices", primary.name()),
        Err(e) => format!("Failed to search for devices ({e}), showing fallback devices"),
    };
    warn!("{notice}");
    let devices = fallback.list_available_devices()?;
    Ok(Discovery {
        devices,
        notice: Some(notice),
    })
}

/// Wire format of `GET /connect/{address}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// One metric inside a [`ReadingResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadingValue {
    pub kind: MetricKind,
    pub value: f64,
}

/// Wire format of `GET /reading/{address}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingResponse {
    pub address: String,
    pub role: DeviceRole,
    pub values: Vec<ReadingValue>,
}

/// Wire format of error responses from the device service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
