//! FixedTransport: a fixed device catalog with synthetic readings.
//!
//! Stands in for a radio when none is available: discovery always returns the
//! same five devices, and connecting one starts a background thread that walks
//! each of the role's metrics with the bounded random-walk generator.

use std::collections::{HashMap, HashSet};
use std::thread;
use std::time::Duration;

use log::{debug, info};
use rand::Rng;
use tokio::sync::mpsc;

use super::{Device, DeviceRole, SAMPLE_STREAM_CAPACITY, SampleStream, SensorTransport};
use crate::error::{ConnectionError, DiscoveryError};
use crate::generator::SimulationProfile;
use crate::metric::{MetricKind, SensorReading};

/// Default time between synthetic readings.
pub const DEFAULT_READING_INTERVAL: Duration = Duration::from_secs(1);

/// The well-known devices offered when real discovery is not available.
pub fn fixed_catalog() -> Vec<Device> {
    vec![
        Device::new("Wahoo KICKR", "00:11:22:33:44:55", DeviceRole::Trainer),
        Device::new("Polar H10", "AA:BB:CC:DD:EE:FF", DeviceRole::HeartRate),
        Device::new("Garmin Cadence", "11:22:33:44:55:66", DeviceRole::Cadence),
        Device::new("Garmin meter", "11:22:33:44:55:77", DeviceRole::Speed),
        Device::new("Test Power Meter", "BB:CC:DD:EE:FF:00", DeviceRole::Power),
    ]
}

/// Random-walk state for one synthetic device.
#[derive(Debug, Clone)]
pub struct SyntheticSensor {
    role: DeviceRole,
    profile: SimulationProfile,
    previous: HashMap<MetricKind, f64>,
}

impl SyntheticSensor {
    pub fn new(role: DeviceRole, profile: SimulationProfile) -> Self {
        Self {
            role,
            profile,
            previous: HashMap::new(),
        }
    }

    pub fn role(&self) -> DeviceRole {
        self.role
    }

    /// Produce the next value of every metric this role reports.
    pub fn read<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<(MetricKind, f64)> {
        self.role
            .metrics()
            .iter()
            .map(|&kind| {
                let value = self
                    .profile
                    .sample(rng, kind, self.previous.get(&kind).copied());
                self.previous.insert(kind, value);
                (kind, value)
            })
            .collect()
    }
}

/// Catalog-backed transport with synthetic sensors.
#[derive(Debug, Clone)]
pub struct FixedTransport {
    catalog: Vec<Device>,
    interval: Duration,
    profile: SimulationProfile,
    unreachable: HashSet<String>,
}

impl Default for FixedTransport {
    fn default() -> Self {
        Self::new(DEFAULT_READING_INTERVAL)
    }
}

impl FixedTransport {
    pub fn new(interval: Duration) -> Self {
        Self {
            catalog: fixed_catalog(),
            interval,
            profile: SimulationProfile::default(),
            unreachable: HashSet::new(),
        }
    }

    /// Replace the catalog.
    pub fn with_catalog(mut self, catalog: Vec<Device>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Make connecting `address` fail, as an out-of-range sensor would.
    pub fn with_unreachable(mut self, address: impl Into<String>) -> Self {
        self.unreachable.insert(address.into());
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn lookup(&self, address: &str) -> Option<&Device> {
        self.catalog
            .iter()
            .find(|d| d.address.eq_ignore_ascii_case(address))
    }
}

impl SensorTransport for FixedTransport {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn list_available_devices(&self) -> Result<Vec<Device>, DiscoveryError> {
        Ok(self.catalog.clone())
    }

    fn connect(&self, device: &Device) -> Result<SampleStream, ConnectionError> {
        let known = self
            .lookup(&device.address)
            .ok_or_else(|| ConnectionError::UnknownDevice(device.address.clone()))?;
        if self.unreachable.contains(&known.address) {
            return Err(ConnectionError::failed(&known.address, "device out of range"));
        }

        let (tx, rx) = mpsc::channel(SAMPLE_STREAM_CAPACITY);
        let mut sensor = SyntheticSensor::new(known.role, self.profile);
        let interval = self.interval;
        let address = known.address.clone();

        thread::Builder::new()
            .name(format!("fixed-sensor-{address}"))
            .spawn(move || {
                let mut rng = rand::rng();
                loop {
                    let reading = SensorReading::now(sensor.read(&mut rng));
                    if tx.blocking_send(reading).is_err() {
                        debug!("fixed sensor {address}: stream closed");
                        return;
                    }
                    thread::sleep(interval);
                }
            })
            .map_err(|e| ConnectionError::failed(&known.address, e))?;

        info!("Connected to {} ({})", known.name, known.address);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn catalog_has_one_device_per_role() {
        let catalog = fixed_catalog();
        for role in DeviceRole::ALL {
            assert_eq!(catalog.iter().filter(|d| d.role == role).count(), 1, "{role}");
        }
    }

    #[test]
    fn catalog_addresses_are_unique() {
        let catalog = fixed_catalog();
        let unique: HashSet<_> = catalog.iter().map(|d| d.address.as_str()).collect();
        assert_eq!(unique.len(), catalog.len());
    }

    #[test]
    fn synthetic_trainer_reads_its_metrics_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let profile = SimulationProfile::default();
        let mut sensor = SyntheticSensor::new(DeviceRole::Trainer, profile);
        for _ in 0..50 {
            let reading = sensor.read(&mut rng);
            let kinds: Vec<_> = reading.iter().map(|(k, _)| *k).collect();
            assert_eq!(kinds, DeviceRole::Trainer.metrics());
            for (kind, value) in reading {
                assert!(profile.range(kind).contains(value));
            }
        }
    }

    #[test]
    fn connect_unknown_address_fails() {
        let transport = FixedTransport::default();
        let ghost = Device::new("Ghost", "DE:AD:BE:EF:00:00", DeviceRole::Power);
        assert!(matches!(
            transport.connect(&ghost),
            Err(ConnectionError::UnknownDevice(_))
        ));
    }

    #[test]
    fn connect_unreachable_address_fails() {
        let transport = FixedTransport::default().with_unreachable("AA:BB:CC:DD:EE:FF");
        let hr = fixed_catalog()[1].clone();
        assert!(matches!(
            transport.connect(&hr),
            Err(ConnectionError::Failed { .. })
        ));
    }

    #[test]
    fn connected_stream_yields_role_metrics() {
        let transport = FixedTransport::new(Duration::from_millis(5));
        let hr = fixed_catalog()[1].clone();
        let mut stream = transport.connect(&hr).unwrap();
        for _ in 0..3 {
            let reading = stream.blocking_recv().expect("stream ended early");
            assert_eq!(reading.samples.len(), 1);
            assert_eq!(reading.samples[0].kind, MetricKind::HeartRate);
            assert!((60.0..=180.0).contains(&reading.samples[0].value));
        }
    }

    #[test]
    fn trainer_reading_arrives_as_one_batch() {
        let transport = FixedTransport::new(Duration::from_millis(5));
        let trainer = fixed_catalog()[0].clone();
        let mut stream = transport.connect(&trainer).unwrap();
        for _ in 0..3 {
            let reading = stream.blocking_recv().expect("stream ended early");
            let kinds: Vec<_> = reading.samples.iter().map(|s| s.kind).collect();
            assert_eq!(kinds, DeviceRole::Trainer.metrics());
            let stamps: HashSet<_> = reading.samples.iter().map(|s| s.timestamp).collect();
            assert_eq!(stamps.len(), 1);
        }
    }
}
