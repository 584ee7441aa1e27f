use trainerlink_core::{
    DeviceRole, FixedTransport, SensorTransport, TrainerConfig, discover_devices,
};

pub fn run(config: &TrainerConfig, json: bool) {
    let transport = config.build_transport();
    let fallback = FixedTransport::new(config.tick_interval());

    let found = match discover_devices(transport.as_ref(), &fallback) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if json {
        match serde_json::to_string_pretty(&found.devices) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Some(notice) = &found.notice {
        println!("⚠ {notice}");
        println!();
    }
    println!(
        "Found {} device(s) via {}:\n",
        found.devices.len(),
        if found.used_fallback() {
            fallback.name()
        } else {
            transport.name()
        }
    );

    for role in DeviceRole::ALL {
        let devices: Vec<_> = found.by_role(role).collect();
        if devices.is_empty() {
            continue;
        }
        println!("  {}", role.label());
        for d in devices {
            println!("    {:<22} {}", d.name, d.address);
        }
    }

    if found.by_role(DeviceRole::Trainer).next().is_none() {
        println!("\n  (no trainer found; training needs one)");
    }
}

