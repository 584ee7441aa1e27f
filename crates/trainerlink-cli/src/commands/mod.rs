pub mod devices;
pub mod serve;
pub mod train;

use std::fs::OpenOptions;
use std::path::Path;

use trainerlink_core::{ConfigError, ElapsedClock, TrainerConfig, TransportMode};

use crate::TransportArgs;

/// Initialise `env_logger`: `RUST_LOG` picks the level (default `warn`).
///
/// With a log file, records are appended there so they never land on the TUI.
pub fn init_logging(log_file: Option<&Path>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Warning: cannot open log file {}: {e}", path.display()),
        }
    }
    let _ = builder.try_init();
}

/// Load the config file, or defaults when none is given. Exits on error.
pub fn load_config(path: Option<&Path>) -> TrainerConfig {
    match path {
        Some(p) => TrainerConfig::load(p).unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }),
        None => TrainerConfig::default(),
    }
}

/// Command-line values that replace config file values when present.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigOverrides {
    pub transport: Option<TransportMode>,
    pub service_url: Option<String>,
    pub tick_interval_ms: Option<u64>,
    pub history_capacity: Option<usize>,
    pub clock: Option<ElapsedClock>,
}

impl ConfigOverrides {
    pub fn from_transport(args: &TransportArgs) -> Self {
        Self {
            transport: args.transport.as_deref().and_then(|t| t.parse().ok()),
            service_url: args.service_url.clone(),
            ..Self::default()
        }
    }
}

pub fn apply_overrides(
    mut config: TrainerConfig,
    o: &ConfigOverrides,
) -> Result<TrainerConfig, ConfigError> {
    if let Some(t) = o.transport {
        config.transport = t;
    }
    if let Some(url) = &o.service_url {
        config.service_url = url.clone();
        // Naming a service implies talking to it.
        if o.transport.is_none() {
            config.transport = TransportMode::Http;
        }
    }
    if let Some(ms) = o.tick_interval_ms {
        config.tick_interval_ms = ms;
    }
    if let Some(n) = o.history_capacity {
        config.history_capacity = n;
    }
    if let Some(c) = o.clock {
        config.elapsed_clock = c;
    }
    config.validate()?;
    Ok(config)
}

/// [`apply_overrides`], exiting with a message on invalid values.
pub fn resolve_config(config: TrainerConfig, o: &ConfigOverrides) -> TrainerConfig {
    apply_overrides(config, o).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    })
}

/// Parse the `--clock` flag.
pub fn parse_clock(s: &str) -> ElapsedClock {
    match s {
        "wall" | "wall_clock" => ElapsedClock::WallClock,
        "arrival" | "arrival_count" => ElapsedClock::ArrivalCount,
        _ => {
            eprintln!("Unknown clock '{s}', using arrival");
            ElapsedClock::ArrivalCount
        }
    }
}
