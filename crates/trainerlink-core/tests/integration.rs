//! Integration tests for trainerlink-core.
//!
//! These run the full session pipeline:
//! transport → selection → feeds → reducer task → published state.

use std::time::Duration;

use tokio::sync::mpsc;
use trainerlink_core::{
    ActiveSource, DeviceRole, DeviceSelection, Event, FixedTransport, MetricKind, MetricSnapshot,
    RuntimeError, SensorReading, SessionRuntime, SessionStats, TrainerConfig, discover_devices,
    fixed_catalog,
};

const WAIT: Duration = Duration::from_secs(5);

fn config(tick_ms: u64) -> TrainerConfig {
    TrainerConfig {
        tick_interval_ms: tick_ms,
        ..TrainerConfig::default()
    }
}

/// A config whose simulated feed never fires during a test.
fn quiet_config() -> TrainerConfig {
    config(600_000)
}

#[tokio::test]
async fn dispatched_events_are_reduced_in_order() {
    let runtime = SessionRuntime::start(&quiet_config());
    let handle = runtime.handle();
    let mut states = handle.subscribe();

    for (i, p) in [150.0, 160.0, 170.0].into_iter().enumerate() {
        let values = MetricSnapshot::new(p, 120.0, 90.0, 30.0);
        handle
            .dispatch(Event::real(values, Duration::from_secs(i as u64)))
            .await
            .unwrap();
    }
    handle.toggle_simulation().await.unwrap();

    let state = tokio::time::timeout(
        WAIT,
        states.wait_for(|s| s.active_source == ActiveSource::Real),
    )
    .await
    .expect("timed out")
    .unwrap()
    .clone();

    assert_eq!(state.total_elapsed_ticks, 3);
    assert_eq!(state.power_history.values(), vec![150.0, 160.0, 170.0]);
    let times: Vec<f64> = state.power_history.iter().map(|p| p.time_offset_minutes).collect();
    assert_eq!(times, vec![0.0, 1.0 / 60.0, 2.0 / 60.0]);
    assert_eq!(state.displayed_values().power, 170.0);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn simulated_feed_fills_bounded_history_without_ticks() {
    let cfg = TrainerConfig {
        history_capacity: 8,
        ..config(5)
    };
    let runtime = SessionRuntime::start(&cfg);
    let mut states = runtime.handle().subscribe();

    tokio::time::timeout(WAIT, states.wait_for(|s| s.simulated_power_history.len() == 8))
        .await
        .expect("timed out")
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = runtime.shutdown().await.unwrap();
    assert_eq!(state.simulated_power_history.len(), 8);
    assert_eq!(state.total_elapsed_ticks, 0);
    assert!(state.power_history.is_empty());
    for v in state.simulated_power_history.values() {
        assert!((100.0..=300.0).contains(&v), "simulated power {v} out of range");
    }
    assert_eq!(state.previous_simulated_values, Some(state.simulated_values));
}

#[tokio::test]
async fn no_simulated_events_after_cancel() {
    let mut runtime = SessionRuntime::start(&config(5));
    let handle = runtime.handle();
    let mut states = handle.subscribe();

    tokio::time::timeout(WAIT, states.wait_for(|s| s.simulated_power_history.len() >= 3))
        .await
        .expect("timed out")
        .unwrap();

    runtime.stop_simulation().await.unwrap();
    assert!(!runtime.simulation_running());
    // Let anything already queued reach the reducer.
    tokio::time::sleep(Duration::from_millis(30)).await;
    let settled = handle.snapshot();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(*handle.snapshot(), *settled);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn resumed_simulation_continues_the_walk() {
    let mut runtime = SessionRuntime::start(&config(5));
    let handle = runtime.handle();
    let mut states = handle.subscribe();

    tokio::time::timeout(WAIT, states.wait_for(|s| s.previous_simulated_values.is_some()))
        .await
        .expect("timed out")
        .unwrap();
    runtime.stop_simulation().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let before = handle.snapshot();
    let seed = before.previous_simulated_values.unwrap();
    let count = before.simulated_power_history.len();

    runtime.resume_simulation();
    let after = tokio::time::timeout(
        WAIT,
        states.wait_for(|s| s.simulated_power_history.len() > count),
    )
    .await
    .expect("timed out")
    .unwrap()
    .clone();

    // One step of the walk moves power by at most 5% of 100..300, plus rounding.
    let next = after.simulated_power_history.values()[count];
    assert!((next - seed.power).abs() <= 10.5, "{} -> {next}", seed.power);

    runtime.shutdown().await.unwrap();
}

fn trainer_reading(power: f64) -> SensorReading {
    SensorReading::now([
        (MetricKind::Power, power),
        (MetricKind::Cadence, 90.0),
        (MetricKind::Speed, 30.0),
    ])
}

fn heart_rate_reading(bpm: f64) -> SensorReading {
    SensorReading::now([(MetricKind::HeartRate, bpm)])
}

#[tokio::test]
async fn each_power_reading_is_one_real_update() {
    let mut runtime = SessionRuntime::start(&quiet_config());
    let (tx, rx) = mpsc::channel(16);
    for reading in [
        trainer_reading(150.0),
        heart_rate_reading(120.0),
        trainer_reading(160.0),
        trainer_reading(170.0),
        heart_rate_reading(130.0),
        trainer_reading(180.0),
    ] {
        tx.send(reading).await.unwrap();
    }
    drop(tx);
    runtime.attach(rx);

    let mut states = runtime.handle().subscribe();
    tokio::time::timeout(WAIT, states.wait_for(|s| s.total_elapsed_ticks == 4))
        .await
        .expect("timed out")
        .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let state = runtime.shutdown().await.unwrap();
    assert_eq!(state.total_elapsed_ticks, 4);
    assert_eq!(state.power_history.values(), vec![150.0, 160.0, 170.0, 180.0]);
    let times: Vec<f64> = state.power_history.iter().map(|p| p.time_offset_minutes).collect();
    assert_eq!(times, vec![0.0, 1.0 / 60.0, 2.0 / 60.0, 3.0 / 60.0]);
    // Heart-rate readings ride along with the next power update.
    assert_eq!(state.real_values.heart_rate, 130.0);
    assert_eq!(state.real_values.cadence, 90.0);
}

#[tokio::test]
async fn trainer_stream_drives_real_updates() {
    const PERIOD_MS: u64 = 50;
    let transport = FixedTransport::new(Duration::from_millis(PERIOD_MS));
    let found = discover_devices(&transport, &FixedTransport::default()).unwrap();
    assert!(!found.used_fallback());

    let mut selection = DeviceSelection::new();
    let trainer = found.by_role(DeviceRole::Trainer).next().unwrap().clone();

    let mut runtime = SessionRuntime::start(&quiet_config());
    runtime.attach(selection.bind(&trainer, &transport).unwrap());
    assert_eq!(selection.start_training().unwrap(), &trainer);

    let mut states = runtime.handle().subscribe();
    tokio::time::timeout(WAIT, states.wait_for(|s| s.total_elapsed_ticks >= 4))
        .await
        .expect("timed out")
        .unwrap();

    let state = runtime.shutdown().await.unwrap();
    assert!(state.total_elapsed_ticks >= 4);
    assert_eq!(state.power_history.len() as u64, state.total_elapsed_ticks);
    // Readings are at least one period apart, so ticks never outrun the clock.
    let wall = state.last_real_at.unwrap();
    let max_ticks = wall.as_millis() as u64 / PERIOD_MS + 1;
    assert!(
        state.total_elapsed_ticks <= max_ticks,
        "{} ticks in {wall:?}",
        state.total_elapsed_ticks
    );
    assert!(state.power_history.len() <= state.power_history.capacity());
    // A trainer reports power, cadence and speed but no heart rate.
    assert!((100.0..=300.0).contains(&state.real_values.power));
    assert!((50.0..=120.0).contains(&state.real_values.cadence));
    assert_eq!(state.real_values.heart_rate, 0.0);
    assert!(state.simulated_power_history.is_empty());

    let stats = SessionStats::from_state(&state);
    assert_eq!(stats.elapsed_ticks, state.total_elapsed_ticks);
    assert!(stats.wall_elapsed.is_some());
}

#[tokio::test]
async fn streams_from_several_devices_merge_into_one_snapshot() {
    let transport = FixedTransport::new(Duration::from_millis(5));
    let mut selection = DeviceSelection::new();
    let mut runtime = SessionRuntime::start(&quiet_config());

    for device in fixed_catalog() {
        if matches!(device.role, DeviceRole::Trainer | DeviceRole::HeartRate) {
            runtime.attach(selection.bind(&device, &transport).unwrap());
        }
    }
    assert_eq!(runtime.active_streams(), 2);

    let mut states = runtime.handle().subscribe();
    let state = tokio::time::timeout(
        WAIT,
        states.wait_for(|s| s.real_values.heart_rate > 0.0 && s.real_values.power > 0.0),
    )
    .await
    .expect("timed out")
    .unwrap()
    .clone();
    assert!((60.0..=180.0).contains(&state.real_values.heart_rate));

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn dispatch_after_shutdown_is_closed() {
    let runtime = SessionRuntime::start(&quiet_config());
    let handle = runtime.handle();
    let final_state = runtime.shutdown().await.unwrap();
    assert_eq!(final_state.total_elapsed_ticks, 0);

    let err = handle.toggle_simulation().await.unwrap_err();
    assert!(matches!(err, RuntimeError::Closed));
}

#[tokio::test]
async fn unrecognized_events_do_not_publish() {
    let runtime = SessionRuntime::start(&quiet_config());
    let handle = runtime.handle();
    let before = handle.snapshot();

    handle.dispatch(Event::Unrecognized).await.unwrap();
    let state = runtime.shutdown().await.unwrap();
    assert_eq!(state, *before);
}
