//! Session and transport configuration.
//!
//! Loaded from an optional JSON file; every field has a default so a partial
//! file (or none at all) works. Command-line flags override afterwards.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::session::{ElapsedClock, HISTORY_CAPACITY};
use crate::transport::{FixedTransport, HttpTransport, SensorTransport};

/// Which transport discovers and streams sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Fixed,
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Http => write!(f, "http"),
        }
    }
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "http" => Ok(Self::Http),
            other => Err(format!("unknown transport '{other}' (expected fixed or http)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Simulated feed cadence, and the poll/sample cadence of transports.
    pub tick_interval_ms: u64,
    pub history_capacity: usize,
    pub elapsed_clock: ElapsedClock,
    pub transport: TransportMode,
    /// Base URL of the device service used by the http transport.
    pub service_url: String,
    pub http_timeout_ms: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            history_capacity: HISTORY_CAPACITY,
            elapsed_clock: ElapsedClock::default(),
            transport: TransportMode::default(),
            service_url: "http://127.0.0.1:8000".to_string(),
            http_timeout_ms: 2000,
        }
    }
}

impl TrainerConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".into()));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("history_capacity must be positive".into()));
        }
        if self.http_timeout_ms == 0 {
            return Err(ConfigError::Invalid("http_timeout_ms must be positive".into()));
        }
        if !(self.service_url.starts_with("http://") || self.service_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "service_url must be an http(s) URL, got '{}'",
                self.service_url
            )));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Construct the configured transport.
    pub fn build_transport(&self) -> Box<dyn SensorTransport> {
        match self.transport {
            TransportMode::Fixed => Box::new(FixedTransport::new(self.tick_interval())),
            TransportMode::Http => Box::new(HttpTransport::new(
                self.service_url.clone(),
                self.http_timeout(),
                self.tick_interval(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults_are_valid() {
        let c = TrainerConfig::default();
        c.validate().unwrap();
        assert_eq!(c.tick_interval(), Duration::from_secs(1));
        assert_eq!(c.history_capacity, 50);
        assert_eq!(c.transport, TransportMode::Fixed);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let f = write_config(r#"{"tick_interval_ms": 250, "elapsed_clock": "wall_clock"}"#);
        let c = TrainerConfig::load(f.path()).unwrap();
        assert_eq!(c.tick_interval_ms, 250);
        assert_eq!(c.elapsed_clock, ElapsedClock::WallClock);
        assert_eq!(c.history_capacity, HISTORY_CAPACITY);
        assert_eq!(c.service_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let f = write_config("{ not json");
        assert!(matches!(
            TrainerConfig::load(f.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            TrainerConfig::load(&missing),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn zero_values_are_rejected() {
        let f = write_config(r#"{"history_capacity": 0}"#);
        assert!(matches!(
            TrainerConfig::load(f.path()),
            Err(ConfigError::Invalid(_))
        ));
        let c = TrainerConfig {
            tick_interval_ms: 0,
            ..TrainerConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn service_url_must_be_http() {
        let c = TrainerConfig {
            service_url: "localhost:8000".into(),
            ..TrainerConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn transport_mode_parses() {
        assert_eq!("HTTP".parse::<TransportMode>().unwrap(), TransportMode::Http);
        assert!("ble".parse::<TransportMode>().is_err());
        assert_eq!(
            TrainerConfig::default().build_transport().name(),
            "fixed"
        );
    }
}
