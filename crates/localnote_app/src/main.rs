use std::io;

use localnote_app::app::{run, AppConfig};

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let config = AppConfig::from_env().unwrap_or_default();
    let stdin = io::stdin();
    if let Err(err) = run(config, stdin.lock(), io::stdout()) {
        eprintln!("localnote_sim failed: {err:#}");
        std::process::exit(1);
    }
}
