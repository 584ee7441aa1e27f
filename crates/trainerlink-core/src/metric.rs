//! Metric kinds, individual sensor samples, and full sample sets.
//!
//! A [`MetricSample`] is one reading of one metric as pushed by a sensor. A
//! [`MetricSnapshot`] is the combined `{power, heart_rate, cadence, speed}` set
//! carried by session events. A [`SensorReading`] groups the samples one
//! device reported at once.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// The metrics a training session tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    /// Pedalling power in watts.
    Power,
    /// Heart rate in beats per minute.
    HeartRate,
    /// Cadence in revolutions per minute.
    Cadence,
    /// Speed in km/h.
    Speed,
}

impl MetricKind {
    /// Every metric, in display order.
    pub const ALL: [MetricKind; 4] = [Self::Power, Self::HeartRate, Self::Cadence, Self::Speed];

    pub fn label(self) -> &'static str {
        match self {
            Self::Power => "Power",
            Self::HeartRate => "Heart Rate",
            Self::Cadence => "Cadence",
            Self::Speed => "Speed",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Power => "W",
            Self::HeartRate => "bpm",
            Self::Cadence => "rpm",
            Self::Speed => "km/h",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Power => write!(f, "power"),
            Self::HeartRate => write!(f, "heart_rate"),
            Self::Cadence => write!(f, "cadence"),
            Self::Speed => write!(f, "speed"),
        }
    }
}

/// One reading of one metric, stamped when it was received.
///
/// Values are not validated; real-sensor bounds are whatever the sensor reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSample {
    pub kind: MetricKind,
    pub value: f64,
    pub timestamp: Instant,
}

impl MetricSample {
    pub fn new(kind: MetricKind, value: f64, timestamp: Instant) -> Self {
        Self {
            kind,
            value,
            timestamp,
        }
    }

    /// Stamp a reading with the current time.
    pub fn now(kind: MetricKind, value: f64) -> Self {
        Self::new(kind, value, Instant::now())
    }
}

/// Everything one device reported in a single reading.
///
/// A trainer reports power, cadence and speed together; they arrive as one
/// reading so the session counts them as one update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorReading {
    pub samples: Vec<MetricSample>,
}

impl SensorReading {
    pub fn new(samples: Vec<MetricSample>) -> Self {
        Self { samples }
    }

    /// Stamp every value with the same current time.
    pub fn now(values: impl IntoIterator<Item = (MetricKind, f64)>) -> Self {
        let timestamp = Instant::now();
        Self::new(
            values
                .into_iter()
                .map(|(kind, value)| MetricSample::new(kind, value, timestamp))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn reports(&self, kind: MetricKind) -> bool {
        self.samples.iter().any(|s| s.kind == kind)
    }

    /// Latest sample time, or `None` for an empty reading.
    pub fn timestamp(&self) -> Option<Instant> {
        self.samples.iter().map(|s| s.timestamp).max()
    }

    /// Overwrite the reported metrics of `snapshot`, leaving the rest alone.
    pub fn apply_to(&self, snapshot: &mut MetricSnapshot) {
        for sample in &self.samples {
            snapshot.set(sample.kind, sample.value);
        }
    }
}

/// A full sample set: the last known value of every metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub power: f64,
    pub heart_rate: f64,
    pub cadence: f64,
    pub speed: f64,
}

impl MetricSnapshot {
    pub fn new(power: f64, heart_rate: f64, cadence: f64, speed: f64) -> Self {
        Self {
            power,
            heart_rate,
            cadence,
            speed,
        }
    }

    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Power => self.power,
            MetricKind::HeartRate => self.heart_rate,
            MetricKind::Cadence => self.cadence,
            MetricKind::Speed => self.speed,
        }
    }

    pub fn set(&mut self, kind: MetricKind, value: f64) {
        match kind {
            MetricKind::Power => self.power = value,
            MetricKind::HeartRate => self.heart_rate = value,
            MetricKind::Cadence => self.cadence = value,
            MetricKind::Speed => self.speed = value,
        }
    }

    /// Copy with one metric replaced.
    pub fn with(mut self, kind: MetricKind, value: f64) -> Self {
        self.set(kind, value);
        self
    }
}
