//! Configuration surface shared by both interceptors.
//!
//! `clap::Args` structs carrying listen ports, the blocklist path, the
//! upstream resolver address, the sink address the DNS codec stamps into
//! block responses, the connection cap on the stream interceptor, and the
//! DNS reload cadence.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::error::config::ConfigError;
use crate::filter::DEFAULT_SINK_V4;

/// Default hot-reload cadence for the DNS interceptor: every 100 datagrams.
pub const DEFAULT_RELOAD_EVERY: u64 = 100;
/// Default cap on concurrently handled stream-interceptor connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 512;
/// Default upstream DNS port when `upstreamDns` carries no explicit port.
pub const DEFAULT_UPSTREAM_DNS_PORT: u16 = 53;

/// Configuration for [`crate::dns::DnsInterceptor`].
#[derive(Debug, Clone, clap::Args)]
pub struct DnsConfig {
    /// UDP port the interceptor listens on.
    #[arg(long = "dns-listen-port", default_value_t = 53)]
    pub listen_port: u16,

    /// Path to the blocklist file, reloaded at startup and every
    /// `reload_every` datagrams.
    #[arg(long = "blocklist")]
    pub blocklist_path: PathBuf,

    /// Upstream resolver, `host[:port]` (default port 53).
    #[arg(long = "upstream-dns", default_value = "1.1.1.1")]
    pub upstream_dns: String,

    /// Sink address stamped into synthesized block answers.
    #[arg(long = "sink-v4", default_value_t = DEFAULT_SINK_V4)]
    pub sink_v4: Ipv4Addr,

    /// Datagram count between automatic blocklist reloads.
    #[arg(long = "dns-reload-every", default_value_t = DEFAULT_RELOAD_EVERY)]
    pub reload_every: u64,
}

impl DnsConfig {
    /// Resolve `upstream_dns` into a `SocketAddr`, defaulting the port to 53
    /// when the field carries a bare host/IP.
    pub fn upstream_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_host_port(&self.upstream_dns, DEFAULT_UPSTREAM_DNS_PORT)
    }
}

/// Configuration for [`crate::stream::StreamInterceptor`].
#[derive(Debug, Clone, clap::Args)]
pub struct StreamConfig {
    /// TCP port the interceptor listens on.
    #[arg(long = "stream-listen-port", default_value_t = 8080)]
    pub listen_port: u16,

    /// Path to the blocklist file.
    #[arg(long = "blocklist")]
    pub blocklist_path: PathBuf,

    /// Upper bound on concurrently handled connections. The accept loop
    /// never blocks to enforce this: once the cap is reached, a freshly
    /// accepted socket is closed immediately rather than queued.
    #[arg(long = "max-connections", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: usize,
}

/// Parse a `host[:port]` string, defaulting to `default_port` when no port
/// is present. Accepts both a literal IPv4/IPv6 address and a bare
/// hostname; a hostname upstream is resolved once here via the blocking
/// std resolver (`ToSocketAddrs`), since DNS forwarding connects directly
/// to a `SocketAddr`.
pub fn parse_host_port(raw: &str, default_port: u16) -> Result<SocketAddr, ConfigError> {
    use std::net::ToSocketAddrs;

    let has_explicit_port = raw.rsplit_once(':').is_some() && raw.parse::<Ipv4Addr>().is_err();
    let candidate = if has_explicit_port {
        raw.to_string()
    } else {
        format!("{raw}:{default_port}")
    };

    candidate
        .to_socket_addrs()
        .map_err(|_| ConfigError::InvalidUpstream(raw.to_string()))?
        .next()
        .ok_or_else(|| ConfigError::InvalidUpstream(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_ip_with_default_port() {
        let addr = parse_host_port("1.1.1.1", 53).unwrap();
        assert_eq!(addr, "1.1.1.1:53".parse().unwrap());
    }

    #[test]
    fn parses_ip_with_explicit_port() {
        let addr = parse_host_port("1.1.1.1:5353", 53).unwrap();
        assert_eq!(addr, "1.1.1.1:5353".parse().unwrap());
    }
}
