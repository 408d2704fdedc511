//! `warden-engine` binary entrypoint.
//!
//! Parses CLI arguments and dispatches to the selected interceptor
//! subcommand. The binary is a thin wrapper: argument parsing and
//! dispatch happen here, the interceptor implementations live in
//! `warden_engine::{dns, stream}`.

use clap::Parser;
use env_logger::Env;
use warden_engine::commands::base::Cli;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    Cli::parse().handle().await
}
