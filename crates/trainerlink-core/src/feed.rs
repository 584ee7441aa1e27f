//! Producers that turn data into session events.
//!
//! [`SimulatedFeed`] ticks the generator on a fixed interval. [`RealFeed`]
//! merges readings from connected sensor streams. Both only enqueue events;
//! the reducer task applies them.

use std::time::Duration;

use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::RuntimeError;
use crate::generator::SimulationProfile;
use crate::metric::{MetricKind, SensorReading};
use crate::reducer::Event;
use crate::runtime::SessionHandle;
use crate::transport::{SAMPLE_STREAM_CAPACITY, SampleStream};

// ---------------------------------------------------------------------------
// Simulated feed
// ---------------------------------------------------------------------------

/// Periodic generator of `UPDATE_SIMULATED_DATA` events.
pub struct SimulatedFeed {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<u64>,
}

impl SimulatedFeed {
    /// Start ticking. The first event fires one `period` after the call.
    ///
    /// The walk is seeded from the session's last simulated sample set, so a
    /// restarted feed continues where the previous one stopped.
    pub fn spawn(handle: SessionHandle, profile: SimulationProfile, period: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let mut previous = handle.snapshot().previous_simulated_values;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut rng = StdRng::from_os_rng();
            let mut emitted = 0u64;
            info!("Simulated feed started ({} ms)", period.as_millis());

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let values = profile.next_snapshot(&mut rng, previous.as_ref());
                        previous = Some(values);
                        let event = Event::simulated(values, handle.elapsed());
                        if handle.dispatch(event).await.is_err() {
                            break;
                        }
                        emitted += 1;
                    }
                }
            }
            info!("Simulated feed stopped after {emitted} events");
            emitted
        });

        Self {
            stop: Some(stop_tx),
            task,
        }
    }

    /// Stop ticking and wait for the task to exit.
    ///
    /// Once this returns no further simulated events will be enqueued.
    /// Returns the number of events the feed emitted.
    pub async fn cancel(mut self) -> Result<u64, RuntimeError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        Ok((&mut self.task).await?)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SimulatedFeed {
    fn drop(&mut self) {
        if self.stop.is_some() {
            self.task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Real feed
// ---------------------------------------------------------------------------

/// Merges sensor streams into `UPDATE_REAL_DATA` events.
///
/// Each device reading updates the metrics it reports in the last known sample
/// set. A reading that carries power is one real update: it produces one event
/// with the whole set, stamped with the reading's arrival offset. Readings
/// without power only refresh the set carried by the next update.
pub struct RealFeed {
    merged: mpsc::Sender<SensorReading>,
    forwarders: Vec<JoinHandle<()>>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<u64>,
}

impl RealFeed {
    pub fn spawn(handle: SessionHandle) -> Self {
        let (merged_tx, mut merged_rx) = mpsc::channel::<SensorReading>(SAMPLE_STREAM_CAPACITY);
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let mut current = handle.snapshot().real_values;
        let started = handle.started();

        let task = tokio::spawn(async move {
            let mut emitted = 0u64;
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    reading = merged_rx.recv() => {
                        let Some(reading) = reading else { break };
                        reading.apply_to(&mut current);
                        if !reading.reports(MetricKind::Power) {
                            continue;
                        }
                        let Some(stamp) = reading.timestamp() else { continue };
                        let at = stamp.saturating_duration_since(started);
                        if handle.dispatch(Event::real(current, at)).await.is_err() {
                            break;
                        }
                        emitted += 1;
                    }
                }
            }
            debug!("Real feed stopped after {emitted} events");
            emitted
        });

        Self {
            merged: merged_tx,
            forwarders: Vec::new(),
            stop: Some(stop_tx),
            task,
        }
    }

    /// Start forwarding a connected device's readings into the session.
    pub fn attach(&mut self, mut stream: SampleStream) {
        let merged = self.merged.clone();
        self.forwarders.retain(|f| !f.is_finished());
        self.forwarders.push(tokio::spawn(async move {
            while let Some(reading) = stream.recv().await {
                if merged.send(reading).await.is_err() {
                    break;
                }
            }
        }));
    }

    /// Number of streams still being forwarded.
    pub fn active_streams(&self) -> usize {
        self.forwarders.iter().filter(|f| !f.is_finished()).count()
    }

    /// Detach every stream and wait for the merge task to exit.
    ///
    /// Returns the number of real events emitted.
    pub async fn cancel(mut self) -> Result<u64, RuntimeError> {
        for f in self.forwarders.drain(..) {
            f.abort();
        }
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        Ok((&mut self.task).await?)
    }
}

impl Drop for RealFeed {
    fn drop(&mut self) {
        for f in &self.forwarders {
            f.abort();
        }
        if self.stop.is_some() {
            self.task.abort();
        }
    }
}
