//! CLI for trainerlink: bind cycling sensors and ride a live training dashboard.

mod commands;
mod tui;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "trainerlink")]
#[command(about = "trainerlink — bind cycling sensors and ride a live training dashboard")]
#[command(version = trainerlink_core::VERSION)]
struct Cli {
    /// JSON config file (tick interval, history size, transport, service URL)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Append logs to this file instead of stderr (RUST_LOG sets the level)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Flags that override the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct TransportArgs {
    /// Sensor transport: fixed (built-in synthetic devices) or http (device service)
    #[arg(long, value_parser = ["fixed", "http"])]
    transport: Option<String>,

    /// Device service base URL for the http transport
    #[arg(long)]
    service_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List sensors in range, falling back to the built-in catalog
    Devices {
        #[command(flatten)]
        transport: TransportArgs,

        /// Print the device list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ride a live training session (TUI dashboard)
    Train {
        #[command(flatten)]
        transport: TransportArgs,

        /// Device address to bind (repeatable). Default: the first trainer found
        #[arg(long = "device")]
        devices: Vec<String>,

        /// Bind the first device of every role
        #[arg(long)]
        all: bool,

        /// Simulated feed interval in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// History time axis: arrival (one real update = one second) or wall
        #[arg(long, value_parser = ["arrival", "wall"])]
        clock: Option<String>,

        /// Power history points kept per series
        #[arg(long)]
        history: Option<usize>,

        /// Run without the dashboard for this many seconds, then print a summary
        #[arg(long)]
        headless: Option<u64>,
    },

    /// Run the HTTP device service
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn main() {
    let cli = Cli::parse();
    commands::init_logging(cli.log_file.as_deref());
    let base = commands::load_config(cli.config.as_deref());

    match cli.command {
        Commands::Devices { transport, json } => {
            let config = commands::resolve_config(
                base,
                &commands::ConfigOverrides::from_transport(&transport),
            );
            commands::devices::run(&config, json)
        }
        Commands::Train {
            transport,
            devices,
            all,
            tick_ms,
            clock,
            history,
            headless,
        } => {
            let overrides = commands::ConfigOverrides {
                tick_interval_ms: tick_ms,
                history_capacity: history,
                clock: clock.as_deref().map(commands::parse_clock),
                ..commands::ConfigOverrides::from_transport(&transport)
            };
            let config = commands::resolve_config(base, &overrides);
            commands::train::run(commands::train::TrainCommandConfig {
                config: &config,
                addresses: &devices,
                bind_all: all,
                headless_secs: headless,
            })
        }
        Commands::Serve { port, host } => commands::serve::run(&host, port),
    }
}
