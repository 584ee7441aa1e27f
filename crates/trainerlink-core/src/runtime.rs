//! Session runtime: one reducer task, many producers.
//!
//! Every event funnels through a single mpsc channel into the task that owns
//! the [`SessionState`]. Each new version is published as an `Arc` on a watch
//! channel, so readers always see a complete state and never block producers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::TrainerConfig;
use crate::error::RuntimeError;
use crate::feed::{RealFeed, SimulatedFeed};
use crate::generator::SimulationProfile;
use crate::reducer::{Event, reduce};
use crate::session::SessionState;
use crate::transport::SampleStream;

/// Events buffered ahead of the reducer.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Cloneable access to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    events: mpsc::Sender<Event>,
    state: watch::Receiver<Arc<SessionState>>,
    started: Instant,
}

impl SessionHandle {
    /// Enqueue an event for the reducer.
    pub async fn dispatch(&self, event: Event) -> Result<(), RuntimeError> {
        self.events.send(event).await.map_err(|_| RuntimeError::Closed)
    }

    /// Enqueue from synchronous code. Must not be called from within an async task.
    pub fn dispatch_blocking(&self, event: Event) -> Result<(), RuntimeError> {
        self.events
            .blocking_send(event)
            .map_err(|_| RuntimeError::Closed)
    }

    pub async fn toggle_simulation(&self) -> Result<(), RuntimeError> {
        self.dispatch(Event::ToggleSimulation).await
    }

    /// The latest published state version.
    pub fn snapshot(&self) -> Arc<SessionState> {
        self.state.borrow().clone()
    }

    /// A receiver notified whenever the state is replaced.
    pub fn subscribe(&self) -> watch::Receiver<Arc<SessionState>> {
        self.state.clone()
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// Offset from session start, used to stamp events.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

async fn run_reducer(
    mut events: mpsc::Receiver<Event>,
    mut stop: oneshot::Receiver<()>,
    publish: watch::Sender<Arc<SessionState>>,
    initial: SessionState,
) -> SessionState {
    let mut state = Arc::new(initial);
    let mut closing = false;

    loop {
        tokio::select! {
            _ = &mut stop, if !closing => {
                // Refuse new events but apply whatever is already queued.
                events.close();
                closing = true;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                if matches!(event, Event::Unrecognized) {
                    debug!("Ignoring unrecognized event");
                    continue;
                }
                let next = reduce(&state, &event);
                debug!(
                    "{} -> ticks={} real={} simulated={}",
                    event.kind(),
                    next.total_elapsed_ticks,
                    next.power_history.len(),
                    next.simulated_power_history.len()
                );
                state = Arc::new(next);
                publish.send_replace(Arc::clone(&state));
            }
        }
    }

    Arc::unwrap_or_clone(state)
}

/// A live training session and its feeds.
pub struct SessionRuntime {
    handle: SessionHandle,
    stop: Option<oneshot::Sender<()>>,
    reducer: JoinHandle<SessionState>,
    simulated: Option<SimulatedFeed>,
    real: RealFeed,
    profile: SimulationProfile,
    tick_interval: Duration,
}

impl SessionRuntime {
    /// Spawn the reducer task, the simulated feed and an empty real feed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: &TrainerConfig) -> Self {
        Self::start_with_profile(config, SimulationProfile::default())
    }

    pub fn start_with_profile(config: &TrainerConfig, profile: SimulationProfile) -> Self {
        let initial = SessionState::new(config.history_capacity, config.elapsed_clock);
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let (state_tx, state_rx) = watch::channel(Arc::new(initial.clone()));
        let (stop_tx, stop_rx) = oneshot::channel();

        let reducer = tokio::spawn(run_reducer(event_rx, stop_rx, state_tx, initial));
        let handle = SessionHandle {
            events: event_tx,
            state: state_rx,
            started: Instant::now(),
        };

        let tick_interval = config.tick_interval();
        let simulated = SimulatedFeed::spawn(handle.clone(), profile, tick_interval);
        let real = RealFeed::spawn(handle.clone());
        info!(
            "Session started (tick {} ms, history {}, clock {:?})",
            config.tick_interval_ms, config.history_capacity, config.elapsed_clock
        );

        Self {
            handle,
            stop: Some(stop_tx),
            reducer,
            simulated: Some(simulated),
            real,
            profile,
            tick_interval,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Feed a connected device's readings into the session.
    pub fn attach(&mut self, stream: SampleStream) {
        self.real.attach(stream);
    }

    pub fn active_streams(&self) -> usize {
        self.real.active_streams()
    }

    pub fn simulation_running(&self) -> bool {
        self.simulated.is_some()
    }

    /// Stop the simulated feed. No simulated events are enqueued after this returns.
    pub async fn stop_simulation(&mut self) -> Result<(), RuntimeError> {
        if let Some(feed) = self.simulated.take() {
            feed.cancel().await?;
        }
        Ok(())
    }

    /// Restart the simulated feed, continuing from the last simulated sample set.
    pub fn resume_simulation(&mut self) {
        if self.simulated.is_none() {
            self.simulated = Some(SimulatedFeed::spawn(
                self.handle.clone(),
                self.profile,
                self.tick_interval,
            ));
        }
    }

    /// Stop every feed, drain queued events and return the final state.
    pub async fn shutdown(mut self) -> Result<SessionState, RuntimeError> {
        self.stop_simulation().await?;
        let real_events = self.real.cancel().await?;
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let final_state = self.reducer.await?;
        info!(
            "Session ended: {} real events, {} ticks",
            real_events, final_state.total_elapsed_ticks
        );
        Ok(final_state)
    }
}
