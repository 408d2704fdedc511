//! `warden` binary entrypoint.
//!
//! Parses CLI arguments and dispatches to command handlers in the
//! `warden_cli` crate. The binary is intentionally a thin wrapper:
//! argument parsing and dispatch happen here, while blocklist loading and
//! interceptor lifecycle live in `warden_cli::commands::base` and
//! `warden_engine`.
//!
//! Examples
//!
//! Check whether a single host would be blocked by a rule file, without
//! starting any interceptor:
//!
//! $ warden check rules.txt ads.example.com
//!
//! Run both interceptors together against a shared blocklist, shutting
//! both down cleanly on `Ctrl-C`:
//!
//! $ warden run --blocklist rules.txt --dns-listen-port 5300 --stream-listen-port 8080
//!
//! See `warden_cli::commands::base::Cli` for the full set of subcommands
//! and options.

use clap::Parser;
use env_logger::Env;
use warden_cli::commands::base::Cli;
use warden_cli::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    Cli::parse().handle().await
}
