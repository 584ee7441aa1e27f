//! HttpTransport: client for the local device service.
//!
//! Discovery, connect and disconnect are plain blocking requests. Once a device
//! is connected a poller thread reads `/reading/{address}` at the sample
//! interval and forwards each response onto the device's stream as one reading.

use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use ureq::Agent;

use super::{
    ConnectResponse, Device, ErrorResponse, ReadingResponse, SAMPLE_STREAM_CAPACITY, SampleStream,
    SensorTransport,
};
use crate::error::{ConnectionError, DiscoveryError};
use crate::metric::SensorReading;

/// Consecutive failed polls after which a stream is closed.
pub const MAX_POLL_FAILURES: u32 = 3;

/// Blocking client for the device service.
#[derive(Clone)]
pub struct HttpTransport {
    agent: Agent,
    base_url: String,
    poll_interval: Duration,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration, poll_interval: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            poll_interval,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// GET `url` and decode the JSON body. Error bodies yield their `detail`.
fn get_json<T: DeserializeOwned>(agent: &Agent, url: &str) -> Result<T, String> {
    match agent.get(url).call() {
        Ok(resp) => resp
            .into_json()
            .map_err(|e| format!("malformed response from {url}: {e}")),
        Err(ureq::Error::Status(code, resp)) => Err(resp
            .into_json::<ErrorResponse>()
            .map(|body| body.detail)
            .unwrap_or_else(|_| format!("HTTP {code} from {url}"))),
        Err(e) => Err(e.to_string()),
    }
}

impl SensorTransport for HttpTransport {
    fn name(&self) -> &'static str {
        "http"
    }

    fn list_available_devices(&self) -> Result<Vec<Device>, DiscoveryError> {
        get_json(&self.agent, &self.url("/devices")).map_err(DiscoveryError::Unavailable)
    }

    fn connect(&self, device: &Device) -> Result<SampleStream, ConnectionError> {
        let url = self.url(&format!("/connect/{}", device.address));
        let resp: ConnectResponse =
            get_json(&self.agent, &url).map_err(|e| ConnectionError::failed(&device.address, e))?;

        match resp.status.as_str() {
            "connected" => {}
            // The service holds one link at a time; reusing ours is fine.
            "already_connected" if resp.device.as_deref() == Some(device.address.as_str()) => {}
            "already_connected" => {
                return Err(ConnectionError::failed(
                    &device.address,
                    format!(
                        "service is connected to {}",
                        resp.device.as_deref().unwrap_or("another device")
                    ),
                ));
            }
            other => {
                return Err(ConnectionError::failed(
                    &device.address,
                    format!("unexpected status '{other}'"),
                ));
            }
        }

        let (tx, rx) = mpsc::channel(SAMPLE_STREAM_CAPACITY);
        let agent = self.agent.clone();
        let reading_url = self.url(&format!("/reading/{}", device.address));
        let interval = self.poll_interval;
        let address = device.address.clone();

        thread::Builder::new()
            .name(format!("http-poll-{address}"))
            .spawn(move || {
                let mut failures = 0;
                loop {
                    match get_json::<ReadingResponse>(&agent, &reading_url) {
                        Ok(resp) => {
                            failures = 0;
                            let values = resp.values.into_iter().map(|v| (v.kind, v.value));
                            let reading = SensorReading::now(values);
                            if !reading.is_empty() && tx.blocking_send(reading).is_err() {
                                debug!("poller {address}: stream closed");
                                return;
                            }
                        }
                        Err(e) => {
                            failures += 1;
                            warn!("poller {address}: {e} ({failures}/{MAX_POLL_FAILURES})");
                            if failures >= MAX_POLL_FAILURES {
                                return;
                            }
                        }
                    }
                    if tx.is_closed() {
                        return;
                    }
                    thread::sleep(interval);
                }
            })
            .map_err(|e| ConnectionError::failed(&device.address, e))?;

        info!("Connected to {} ({}) via {}", device.name, device.address, self.base_url);
        Ok(rx)
    }

    fn disconnect(&self) -> Result<(), ConnectionError> {
        let resp: ConnectResponse = get_json(&self.agent, &self.url("/disconnect"))
            .map_err(|e| ConnectionError::failed(&self.base_url, e))?;
        info!("Device service: {}", resp.status);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::DeviceRole;

    // Port 9 (discard) is never served on loopback in test environments.
    fn unreachable() -> HttpTransport {
        HttpTransport::new(
            "http://127.0.0.1:9/",
            Duration::from_millis(200),
            Duration::from_millis(10),
        )
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(unreachable().base_url(), "http://127.0.0.1:9");
        assert_eq!(unreachable().url("/devices"), "http://127.0.0.1:9/devices");
    }

    #[test]
    fn unreachable_service_is_discovery_unavailable() {
        assert!(matches!(
            unreachable().list_available_devices(),
            Err(DiscoveryError::Unavailable(_))
        ));
    }

    #[test]
    fn unreachable_service_fails_connect() {
        let d = Device::new("Wahoo KICKR", "00:11:22:33:44:55", DeviceRole::Trainer);
        match unreachable().connect(&d) {
            Err(ConnectionError::Failed { address, .. }) => assert_eq!(address, d.address),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
