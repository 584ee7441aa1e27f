use std::time::Duration;

use trainerlink_core::{
    Device, DeviceRole, DeviceSelection, Discovery, FixedTransport, SensorTransport,
    SessionRuntime, SessionState, SessionStats, TrainerConfig, discover_devices, format_elapsed,
};

pub struct TrainCommandConfig<'a> {
    pub config: &'a TrainerConfig,
    pub addresses: &'a [String],
    pub bind_all: bool,
    pub headless_secs: Option<u64>,
}

pub fn run(cmd: TrainCommandConfig<'_>) {
    let config = cmd.config;
    let transport = config.build_transport();
    let fallback = FixedTransport::new(config.tick_interval());

    let found = discover_devices(transport.as_ref(), &fallback).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
    if let Some(notice) = &found.notice {
        eprintln!("⚠ {notice}");
    }
    // Fallback devices only exist in the built-in catalog.
    let binder: &dyn SensorTransport = if found.used_fallback() {
        &fallback
    } else {
        transport.as_ref()
    };

    let wanted = choose_devices(&found, cmd.addresses, cmd.bind_all).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });

    let mut selection = DeviceSelection::new();
    let mut streams = Vec::new();
    for device in &wanted {
        match selection.bind(device, binder) {
            Ok(stream) => {
                println!("  ✓ {} bound as {}", device.name, device.role.label());
                streams.push(stream);
            }
            Err(e) => eprintln!("  ✗ {e}"),
        }
    }

    let trainer = match selection.start_training() {
        Ok(t) => t.clone(),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    println!("Training with {} ({})", trainer.name, trainer.address);

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Error: cannot start runtime: {e}");
        std::process::exit(1);
    });
    let runtime = {
        let _guard = rt.enter();
        let mut runtime = SessionRuntime::start(config);
        for stream in streams {
            runtime.attach(stream);
        }
        runtime
    };

    match cmd.headless_secs {
        Some(secs) => rt.block_on(tokio::time::sleep(Duration::from_secs(secs))),
        None => {
            let bound: Vec<Device> = selection.bound().cloned().collect();
            let mut app = crate::tui::app::App::new(runtime.handle(), bound, found.notice.clone());
            if let Err(e) = app.run() {
                eprintln!("TUI error: {e}");
            }
        }
    }

    let final_state = match rt.block_on(runtime.shutdown()) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = binder.disconnect() {
        log::warn!("{e}");
    }
    print_summary(&final_state);
}

/// Resolve which devices to bind.
///
/// Explicit addresses win. Otherwise `all` takes the first device of every
/// role, and the default is just the first trainer.
pub fn choose_devices(
    found: &Discovery,
    addresses: &[String],
    all: bool,
) -> Result<Vec<Device>, String> {
    if !addresses.is_empty() {
        return addresses
            .iter()
            .map(|a| {
                found
                    .find(a)
                    .cloned()
                    .ok_or_else(|| format!("no device with address {a}"))
            })
            .collect();
    }
    let roles: &[DeviceRole] = if all {
        &DeviceRole::ALL
    } else {
        &[DeviceRole::Trainer]
    };
    Ok(roles
        .iter()
        .filter_map(|&role| found.by_role(role).next().cloned())
        .collect())
}

fn print_summary(state: &SessionState) {
    let stats = SessionStats::from_state(state);
    println!();
    println!("Session summary");
    println!("  Elapsed:        {}", format_elapsed(stats.elapsed));
    if let Some(wall) = stats.wall_elapsed {
        println!("  Wall clock:     {}", format_elapsed(wall));
    }
    println!("  Real updates:   {}", stats.elapsed_ticks);
    for (label, summary) in [
        ("Real power", &stats.real_power),
        ("Sim power", &stats.simulated_power),
    ] {
        match (summary.average, summary.max) {
            (Some(avg), Some(max)) => println!(
                "  {label:<15} avg {avg:.0} W  max {max:.0} W  {} {}",
                summary.trend.arrow(),
                summary.trend
            ),
            _ => println!("  {label:<15} —"),
        }
    }
}
