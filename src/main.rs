#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use log::info;
    use sss_gems::logging::init_logging;
    use sss_gems::platform::WinitHost;
    use sss_gems::{run, AppState, DemoConfig};

    init_logging();

    let config = DemoConfig::default();
    let mut host = WinitHost::new(config.clone());
    let mut state = AppState::new(&config);

    match run(&mut host, &mut state, &config) {
        Ok(report) => info!("shut down after {} frames", report.frames),
        Err(err) => {
            eprintln!("Error: {}", err.report());
            std::process::exit(1);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
