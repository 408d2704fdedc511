//! Top-level CLI parser and subcommand dispatch for `warden-engine`.

use crate::config::{DnsConfig, StreamConfig};
use crate::dns::DnsInterceptor;
use crate::filter::BlocklistStore;
use crate::stream::StreamInterceptor;

/// CLI entrypoint for the `warden-engine` binary.
///
/// Selects which interceptor to run standalone; both read the same
/// blocklist file format but run as independent processes here (the
/// combined-lifecycle driver lives in the companion `warden` binary, see
/// `cli::commands::base`).
#[derive(Debug, clap::Parser)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub interceptor: InterceptorCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum InterceptorCommand {
    /// Run the DNS interceptor standalone.
    Dns(DnsConfig),
    /// Run the stream (TCP/HTTP/TLS) interceptor standalone.
    Stream(StreamConfig),
}

impl Cli {
    /// Start the selected interceptor and block until `Ctrl-C`.
    pub async fn handle(self) -> std::io::Result<()> {
        match self.interceptor {
            InterceptorCommand::Dns(config) => run_dns(config).await,
            InterceptorCommand::Stream(config) => run_stream(config).await,
        }
    }
}

async fn run_dns(config: DnsConfig) -> std::io::Result<()> {
    let store = BlocklistStore::new();
    let interceptor = DnsInterceptor::start(config, store)
        .await
        .map_err(|err| std::io::Error::other(err.to_string()))?;

    tokio::signal::ctrl_c().await?;
    log::info!("Ctrl-C received, stopping DNS interceptor");
    interceptor.stop().await;
    Ok(())
}

async fn run_stream(config: StreamConfig) -> std::io::Result<()> {
    let store = BlocklistStore::new();
    let interceptor = StreamInterceptor::start(config, store)
        .await
        .map_err(|err| std::io::Error::other(err.to_string()))?;

    tokio::signal::ctrl_c().await?;
    log::info!("Ctrl-C received, stopping stream interceptor");
    interceptor.stop().await;
    Ok(())
}
