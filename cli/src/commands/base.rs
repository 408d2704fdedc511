//! CLI command definitions and dispatch for the `warden` driver.
//!
//! `warden` is the surrounding application: it owns blocklist loading, a
//! one-off `IsBlocked` check useful for debugging a rule file, and the
//! combined start/stop lifecycle of both interceptors together.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use warden_engine::config::{DnsConfig, StreamConfig, DEFAULT_MAX_CONNECTIONS, DEFAULT_RELOAD_EVERY};
use warden_engine::dns::DnsInterceptor;
use warden_engine::filter::{BlocklistStore, DEFAULT_SINK_V4};
use warden_engine::stream::StreamInterceptor;

use crate::error::{Result, WardenError};

/// Top-level CLI structure parsed from program arguments.
#[derive(Parser)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub operation: Operation,
}

impl Cli {
    /// Dispatch and execute the selected subcommand.
    pub async fn handle(self) -> Result<()> {
        self.operation.handle().await
    }
}

#[derive(Debug, Subcommand)]
pub enum Operation {
    /// Load a blocklist and report whether a single host would be blocked.
    Check(CheckArgs),
    /// Start the DNS and stream interceptors together and run until `Ctrl-C`.
    Run(RunArgs),
}

impl Operation {
    async fn handle(self) -> Result<()> {
        match self {
            Operation::Check(args) => args.handle().await,
            Operation::Run(args) => args.handle().await,
        }
    }
}

/// `warden check <blocklist> <host>`: answer `IsBlocked(host)` after
/// loading `blocklist`, without starting any interceptor. Useful for
/// validating a rule file before wiring it into `run`.
#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    /// Path to the blocklist file to load.
    pub blocklist: PathBuf,

    /// Host name to check.
    pub host: String,
}

impl CheckArgs {
    async fn handle(self) -> Result<()> {
        let store = BlocklistStore::new();
        store.reload(&self.blocklist).await;

        let blocked = store.is_blocked(&self.host);
        println!(
            "{} ({} entries loaded, version {})",
            if blocked { "BLOCKED" } else { "allowed" },
            store.len(),
            store.version()
        );
        Ok(())
    }
}

/// `warden run`: start both interceptors against a shared blocklist and
/// shut both down gracefully on `Ctrl-C`.
///
/// The interceptors' own `DnsConfig`/`StreamConfig` argument structs both
/// carry a `blocklist_path` field, so they aren't flattened directly here
/// (that would register the `--blocklist` flag twice); instead `RunArgs`
/// exposes one shared blocklist path and builds each interceptor's config
/// from it.
#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Path to the blocklist file, shared by both interceptors.
    #[arg(long = "blocklist")]
    pub blocklist_path: PathBuf,

    /// UDP port the DNS interceptor listens on.
    #[arg(long = "dns-listen-port", default_value_t = 53)]
    pub dns_listen_port: u16,

    /// Upstream resolver, `host[:port]` (default port 53).
    #[arg(long = "upstream-dns", default_value = "1.1.1.1")]
    pub upstream_dns: String,

    /// Sink address stamped into synthesized DNS block answers.
    #[arg(long = "sink-v4", default_value_t = DEFAULT_SINK_V4)]
    pub sink_v4: Ipv4Addr,

    /// Datagram count between automatic blocklist reloads.
    #[arg(long = "dns-reload-every", default_value_t = DEFAULT_RELOAD_EVERY)]
    pub dns_reload_every: u64,

    /// TCP port the stream interceptor listens on.
    #[arg(long = "stream-listen-port", default_value_t = 8080)]
    pub stream_listen_port: u16,

    /// Upper bound on concurrently handled stream connections.
    #[arg(long = "max-connections", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: usize,
}

impl RunArgs {
    async fn handle(self) -> Result<()> {
        // Both interceptors share one store; the DNS interceptor's own
        // periodic reload keeps it fresh for both.
        let store = BlocklistStore::new();

        let dns_config = DnsConfig {
            listen_port: self.dns_listen_port,
            blocklist_path: self.blocklist_path.clone(),
            upstream_dns: self.upstream_dns,
            sink_v4: self.sink_v4,
            reload_every: self.dns_reload_every,
        };
        let stream_config = StreamConfig {
            listen_port: self.stream_listen_port,
            blocklist_path: self.blocklist_path,
            max_connections: self.max_connections,
        };

        let dns = DnsInterceptor::start(dns_config, store.clone())
            .await
            .map_err(WardenError::dns_interceptor)?;
        let stream = StreamInterceptor::start(stream_config, store)
            .await
            .map_err(WardenError::stream_interceptor)?;

        log::info!(
            "warden running: dns on {}, stream on {}",
            dns.local_addr(),
            stream.local_addr()
        );

        tokio::signal::ctrl_c().await?;
        log::info!("Ctrl-C received, stopping both interceptors");

        dns.stop().await;
        stream.stop().await;
        Ok(())
    }
}
