use trainerlink_core::fixed_catalog;

pub fn run(host: &str, port: u16) {
    let base = format!("http://{host}:{port}");

    println!("🚴 Trainerlink Device Service v{}", trainerlink_core::VERSION);
    println!("   {base}");
    println!("   {} devices available", fixed_catalog().len());
    println!();
    println!("   Endpoints:");
    println!("     GET /                     API index (try: curl {base})");
    println!("     GET /devices              List available devices");
    println!("     GET /connect/{{address}}    Connect one device");
    println!("     GET /disconnect           Disconnect the current device");
    println!("     GET /reading/{{address}}    Latest readings from the connected device");
    println!();
    println!("   Ride against it with:");
    println!("     trainerlink train --transport http --service-url {base}");
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: cannot start runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(trainerlink_server::run_server(host, port)) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
