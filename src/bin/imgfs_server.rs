//! Standalone server entry point, mirroring the original's separate
//! `imgfs_server_service` startup path (`server_startup`/`server_shutdown`)
//! as distinct from the `imgfscmd` CLI front-end. `imgfs serve` (the main
//! binary's subcommand) runs the same [`imgfs::Server`] — this binary exists
//! for callers that want the server without the rest of the CLI surface.

use imgfs::{Server, Store, DEFAULT_LISTENING_PORT};
use std::env;
use std::process::ExitCode;

fn usage(program: &str) {
    eprintln!("Usage: {} <imgfs_file> [port]", program);
}

fn run() -> imgfs::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "imgfs_server".into());
    let file = match args.next() {
        Some(f) => f,
        None => {
            usage(&program);
            return Err(imgfs::Error::NotEnoughArguments);
        }
    };
    let port: u16 = match args.next() {
        Some(p) => p.parse().map_err(|_| imgfs::Error::InvalidArgument)?,
        None => DEFAULT_LISTENING_PORT,
    };

    let store = Store::open(&file)?;
    let addr = format!("0.0.0.0:{}", port);
    let server = Server::bind(&addr, store)?;
    server.run()
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {}", e.short_message());
            ExitCode::from(e.code() as u8)
        }
    }
}
