//! Stream Interceptor: a TCP accept loop that classifies each flow as
//! HTTP, an HTTP `CONNECT` tunnel, or raw TLS, enforces the blocklist on
//! the extracted host, and otherwise relays the flow transparently.
//!
//! Shutdown uses the same `watch`-channel pattern as [`crate::dns`].
//! Handler fan-out is bounded by a `tokio::sync::Semaphore` sized by
//! `max_connections`: the accept loop itself never blocks on a permit.
//! When the semaphore is exhausted the newly accepted socket is closed
//! immediately and the event is logged at `warn`.

pub mod http;
pub mod sni;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::Resolver;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Semaphore};

use crate::config::StreamConfig;
use crate::error::stream::StreamError;
use crate::filter::BlocklistStore;

/// Bytes peeked off the front of a new connection to attempt TLS SNI
/// classification before falling back to the HTTP parser.
const TLS_PEEK_SIZE: usize = 8 * 1024;
/// Receive timeout applied to every accepted client socket.
const CLIENT_RECV_TIMEOUT: Duration = Duration::from_secs(5);
const HTTP_PORT: u16 = 80;
const HTTPS_PORT: u16 = 443;

/// A running (or stopped) stream interceptor instance. See [`crate::dns::DnsInterceptor`]
/// for the analogous owned-value design.
pub struct StreamInterceptor {
    running: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    join_handle: tokio::task::JoinHandle<()>,
    local_addr: SocketAddr,
}

impl StreamInterceptor {
    pub async fn start(config: StreamConfig, store: BlocklistStore) -> Result<Self, StreamError> {
        let listener = TcpListener::bind(("0.0.0.0", config.listen_port)).await?;
        let local_addr = listener.local_addr()?;
        let running = Arc::new(AtomicBool::new(true));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        store.reload(&config.blocklist_path).await;

        let resolver = Arc::new(
            Resolver::builder_with_config(
                hickory_resolver::config::ResolverConfig::default(),
                TokioConnectionProvider::default(),
            )
            .build(),
        );
        let permits = Arc::new(Semaphore::new(config.max_connections));

        let loop_running = running.clone();
        let join_handle = tokio::spawn(async move {
            accept_loop(listener, store, resolver, permits, shutdown_rx).await;
            loop_running.store(false, Ordering::Release);
        });

        log::info!("Stream interceptor listening on {local_addr}");

        Ok(Self {
            running,
            shutdown_tx,
            join_handle,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.join_handle.await;
    }
}

async fn accept_loop(
    listener: TcpListener,
    store: BlocklistStore,
    resolver: Arc<Resolver<TokioConnectionProvider>>,
    permits: Arc<Semaphore>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                log::info!("Stream interceptor shutting down");
                break;
            }
            result = listener.accept() => {
                let (client, peer_addr) = match result {
                    Ok(pair) => pair,
                    Err(err) => {
                        log::warn!("stream accept error: {err}");
                        continue;
                    }
                };

                let permit = match permits.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => {
                        log::warn!("connection cap reached, dropping new connection from {peer_addr}");
                        drop(client);
                        continue;
                    }
                };

                let store = store.clone();
                let resolver = resolver.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(err) = handle_connection(client, &store, &resolver).await {
                        log::debug!("connection from {peer_addr} ended: {err}");
                    }
                });
            }
        }
    }
}

async fn handle_connection(
    mut client: TcpStream,
    store: &BlocklistStore,
    resolver: &Resolver<TokioConnectionProvider>,
) -> std::io::Result<()> {
    client.set_nodelay(true).ok();

    let mut peek_buf = vec![0u8; TLS_PEEK_SIZE];
    let peeked = tokio::time::timeout(CLIENT_RECV_TIMEOUT, client.peek(&mut peek_buf))
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "peek timeout"))??;

    if let Some(server_name) = sni::parse_sni(&peek_buf[..peeked]) {
        if store.is_blocked(&server_name) {
            log::info!("blocked TLS SNI {server_name}");
            client.shutdown().await.ok();
            return Ok(());
        }
    }

    // No SNI decision closed the flow; fall through to HTTP parsing on the
    // same (already-peeked) stream.
    let head = match tokio::time::timeout(CLIENT_RECV_TIMEOUT, http::read_request_head(&mut client))
        .await
    {
        Ok(Some(head)) => head,
        Ok(None) => {
            client.shutdown().await.ok();
            return Ok(());
        }
        Err(_) => {
            client.shutdown().await.ok();
            return Ok(());
        }
    };

    let Some(host) = head.host_without_port() else {
        client.shutdown().await.ok();
        return Ok(());
    };

    if store.is_blocked(host) {
        log::info!("blocked HTTP host {host}");
        client.shutdown().await.ok();
        return Ok(());
    }

    let upstream_port = if head.is_connect() { HTTPS_PORT } else { HTTP_PORT };
    let upstream_addr = match resolve_first(resolver, host, upstream_port).await {
        Some(addr) => addr,
        None => {
            client.shutdown().await.ok();
            return Ok(());
        }
    };

    let mut upstream = match TcpStream::connect(upstream_addr).await {
        Ok(stream) => stream,
        Err(err) => {
            log::debug!("failed to connect upstream {upstream_addr} for {host}: {err}");
            client.shutdown().await.ok();
            return Ok(());
        }
    };
    upstream.set_nodelay(true).ok();

    if head.is_connect() {
        client
            .write_all(b"HTTP/1.1 200 Connection Established\r\n\r\n")
            .await?;
    } else {
        upstream.write_all(&head.raw).await?;
    }

    relay(client, upstream).await
}

/// Resolve `host` to its first usable address and pair it with `port`.
/// Returns `None` on resolution failure; the caller treats that as a
/// transient I/O error and closes the connection.
async fn resolve_first(
    resolver: &Resolver<TokioConnectionProvider>,
    host: &str,
    port: u16,
) -> Option<SocketAddr> {
    if let Ok(ip) = host.parse::<std::net::IpAddr>() {
        return Some(SocketAddr::new(ip, port));
    }
    let lookup = resolver.lookup_ip(host).await.ok()?;
    let ip = lookup.iter().next()?;
    Some(SocketAddr::new(ip, port))
}

/// Bidirectionally relay `client` and `upstream` until both directions
/// reach EOF or error. Each direction is its own task; on termination it
/// half-closes the peer's write side.
async fn relay(client: TcpStream, upstream: TcpStream) -> std::io::Result<()> {
    let (mut client_rd, mut client_wr) = client.into_split();
    let (mut upstream_rd, mut upstream_wr) = upstream.into_split();

    let client_to_upstream = tokio::spawn(async move {
        let result = tokio::io::copy(&mut client_rd, &mut upstream_wr).await;
        upstream_wr.shutdown().await.ok();
        result
    });
    let upstream_to_client = tokio::spawn(async move {
        let result = tokio::io::copy(&mut upstream_rd, &mut client_wr).await;
        client_wr.shutdown().await.ok();
        result
    });

    let _ = tokio::join!(client_to_upstream, upstream_to_client);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocked_http_host_closes_without_upstream_connect() {
        let store = BlocklistStore::new();
        let dir = write_blocklist("tracker.io\n");
        store.reload(dir.path()).await;

        let interceptor = StreamInterceptor::start(
            StreamConfig {
                listen_port: 0,
                blocklist_path: dir.path().to_path_buf(),
                max_connections: 8,
            },
            store,
        )
        .await
        .unwrap();

        let mut client = TcpStream::connect(interceptor.local_addr()).await.unwrap();
        client
            .write_all(b"GET / HTTP/1.1\r\nHost: tracker.io\r\n\r\n")
            .await
            .unwrap();
        let mut buf = [0u8; 16];
        let n = client.read(&mut buf).await.unwrap_or(0);
        assert_eq!(n, 0, "blocked connection should be closed with no bytes sent");

        interceptor.stop().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_restart_succeeds() {
        let store = BlocklistStore::new();
        let dir = write_blocklist("");
        let config = StreamConfig {
            listen_port: 0,
            blocklist_path: dir.path().to_path_buf(),
            max_connections: 8,
        };

        let interceptor = StreamInterceptor::start(config.clone(), store.clone())
            .await
            .unwrap();
        interceptor.stop().await;

        let restarted = StreamInterceptor::start(config, store).await;
        assert!(restarted.is_ok());
        restarted.unwrap().stop().await;
    }

    fn write_blocklist(contents: &str) -> TempFile {
        let path = std::env::temp_dir().join(format!(
            "warden-engine-stream-test-{}-{}.txt",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::write(&path, contents).unwrap();
        TempFile { path }
    }

    struct TempFile {
        path: std::path::PathBuf,
    }

    impl TempFile {
        fn path(&self) -> &std::path::Path {
            &self.path
        }
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
