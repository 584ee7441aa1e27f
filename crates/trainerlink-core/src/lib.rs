//! # trainerlink-core
//!
//! **A live view of an indoor training session.**
//!
//! `trainerlink-core` models a cycling session fed by two sources at once: real
//! sensors (trainer, heart-rate strap, cadence, speed and power meters) and a
//! simulated feed that produces plausible readings when no hardware is around.
//! Both keep a bounded power history; the dashboard shows whichever is active.
//!
//! ## Quick Start
//!
//! ```no_run
//! use trainerlink_core::{
//!     DeviceRole, DeviceSelection, FixedTransport, SessionRuntime, SessionStats, TrainerConfig,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = TrainerConfig::default();
//! let transport = FixedTransport::new(config.tick_interval());
//!
//! let mut runtime = SessionRuntime::start(&config);
//! let mut selection = DeviceSelection::new();
//! for device in trainerlink_core::fixed_catalog() {
//!     if device.role == DeviceRole::Trainer {
//!         runtime.attach(selection.bind(&device, &transport)?);
//!     }
//! }
//! selection.start_training()?;
//!
//! let handle = runtime.handle();
//! handle.toggle_simulation().await?;
//! let stats = SessionStats::from_state(&handle.snapshot());
//! println!("{} ticks", stats.elapsed_ticks);
//!
//! let final_state = runtime.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Sensors / Generator → Feeds → Event queue → Reducer task → `Arc<SessionState>`
//!
//! The reducer ([`reduce`]) is a pure function and the only place session
//! invariants live. Everything else produces events or reads published states.

pub mod config;
pub mod error;
pub mod feed;
pub mod generator;
pub mod metric;
pub mod reducer;
pub mod runtime;
pub mod selection;
pub mod session;
pub mod stats;
pub mod transport;

pub use config::{TrainerConfig, TransportMode};
pub use error::{ConfigError, ConnectionError, DiscoveryError, RuntimeError, SelectionError};
pub use feed::{RealFeed, SimulatedFeed};
pub use generator::{MetricRange, SimulationProfile, generate, round_for_display};
pub use metric::{MetricKind, MetricSample, MetricSnapshot, SensorReading};
pub use reducer::{DataUpdate, Event, reduce, reduce_all};
pub use runtime::{SessionHandle, SessionRuntime};
pub use selection::DeviceSelection;
pub use session::{
    ActiveSource, ElapsedClock, HISTORY_CAPACITY, History, HistoryPoint, SessionState,
};
pub use stats::{PowerTrend, SeriesSummary, SessionStats, format_elapsed};
pub use transport::{
    ConnectResponse, Device, DeviceRole, Discovery, ErrorResponse, FixedTransport, HttpTransport,
    ReadingResponse, ReadingValue, SampleStream, SensorTransport, SyntheticSensor,
    discover_devices, fixed_catalog,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
