#[macro_use]
extern crate log;
extern crate simple_logger;
extern crate stun_probe;

use std::error::Error;

use stun_probe::options;
use stun_probe::server::Responder;

fn main() -> Result<(), Box<dyn Error>> {
    let args = options::parse_responder_args();
    let level = if args.flag_verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    simple_logger::init_with_level(level)?;

    let mut responder = Responder::bind(args.flag_listen.as_str())?;
    if let Some(mapped) = args.announce()? {
        info!("Announcing {}:{} to every requester", mapped.ip, mapped.port);
        responder = responder.announce(mapped);
    }
    info!("STUN responder listening on {}", responder.local_addr()?);
    responder.run();
    Ok(())
}
