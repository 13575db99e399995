#[macro_use]
extern crate log;
extern crate serde_json;
extern crate simple_logger;
extern crate stun_probe;

use std::error::Error;

use stun_probe::options;

fn main() -> Result<(), Box<dyn Error>> {
    let args = options::parse_probe_args();
    let level = if args.flag_verbose {
        log::Level::Debug
    } else if args.flag_json {
        log::Level::Warn
    } else {
        log::Level::Info
    };
    simple_logger::init_with_level(level)?;

    match args.config().and_then(|config| {
        debug!("Discovering with {:?}", config);
        config.discover()
    }) {
        Ok(result) => {
            if args.flag_json {
                println!("{}", serde_json::to_string(&result)?);
            } else {
                println!("External IP: {}", result.ip);
                println!("External port: {}", result.port);
            }
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1)
        }
    }
}
