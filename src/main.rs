use handmade::Config;

#[macro_use]
extern crate log;

fn main() {
    env_logger::init();
    // log levels: error, warn, info, debug, trace
    info!("starting up... log level: {}", log::max_level());

    let config = Config::from_env();

    #[cfg(target_os = "windows")]
    let result = handmade::os::win32::main(config);
    #[cfg(not(target_os = "windows"))]
    let result = handmade::os::headless::main(config);

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
