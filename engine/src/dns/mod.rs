//! DNS Interceptor: a recursive UDP relay that sink-holes blocked names.
//!
//! One UDP socket is bound for the lifetime of the interceptor. Each
//! datagram is either answered locally (a synthesized block response) or
//! forwarded to the configured upstream resolver on a fresh ephemeral
//! socket. Shutdown is driven by a `tokio::sync::watch` channel the recv
//! loop selects against; no hard-coded loopback reconnection is
//! involved.

pub mod codec;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::watch;

use crate::config::DnsConfig;
use crate::error::dns::DnsError;
use crate::filter::BlocklistStore;

/// Maximum DNS-over-UDP datagram size this relay will read or forward.
const MAX_DATAGRAM_SIZE: usize = 4096;
/// How long to wait for an upstream reply before giving up on a query.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

/// A running (or stopped) DNS interceptor instance.
///
/// Owned, not a process-wide singleton: each instance carries its own
/// running flag, so multiple interceptors on different ports can
/// coexist.
pub struct DnsInterceptor {
    running: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    join_handle: tokio::task::JoinHandle<()>,
    local_addr: SocketAddr,
}

impl DnsInterceptor {
    /// Bind the listening socket and spawn the recv loop.
    ///
    /// Binding failures are fatal and returned to the caller; the
    /// interceptor is simply never constructed.
    pub async fn start(config: DnsConfig, store: BlocklistStore) -> Result<Self, DnsError> {
        let upstream = config.upstream_addr()?;
        let socket = UdpSocket::bind(("0.0.0.0", config.listen_port)).await?;
        let local_addr = socket.local_addr()?;
        let running = Arc::new(AtomicBool::new(true));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        store.reload(&config.blocklist_path).await;

        let loop_running = running.clone();
        let blocklist_path = config.blocklist_path.clone();
        let reload_every = config.reload_every.max(1);
        let sink_v4 = config.sink_v4;
        let join_handle = tokio::spawn(async move {
            recv_loop(
                socket,
                upstream,
                store,
                blocklist_path,
                reload_every,
                sink_v4,
                shutdown_rx,
            )
            .await;
            loop_running.store(false, Ordering::Release);
        });

        log::info!("DNS interceptor listening on {local_addr}, forwarding to {upstream}");

        Ok(Self {
            running,
            shutdown_tx,
            join_handle,
            local_addr,
        })
    }

    /// Address the interceptor actually bound to (useful when `listen_port`
    /// was 0, e.g. in tests).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop the interceptor and wait for its recv loop to exit.
    ///
    /// Idempotent: sending on an already-closed watch channel, or a
    /// finished join handle, is harmless.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.join_handle.await;
    }
}

async fn recv_loop(
    socket: UdpSocket,
    upstream: SocketAddr,
    store: BlocklistStore,
    blocklist_path: std::path::PathBuf,
    reload_every: u64,
    sink_v4: std::net::Ipv4Addr,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let socket = Arc::new(socket);
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let mut datagram_count: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                log::info!("DNS interceptor shutting down");
                break;
            }
            result = socket.recv_from(&mut buf) => {
                let (len, client_addr) = match result {
                    Ok(pair) => pair,
                    Err(err) => {
                        log::warn!("DNS recv_from error: {err}");
                        continue;
                    }
                };

                datagram_count += 1;
                if datagram_count % reload_every == 0 {
                    store.reload(&blocklist_path).await;
                }

                let payload = buf[..len].to_vec();
                let socket = socket.clone();
                let store = store.clone();
                tokio::spawn(async move {
                    handle_datagram(&socket, &payload, client_addr, &store, upstream, sink_v4).await;
                });
            }
        }
    }
}

async fn handle_datagram(
    socket: &UdpSocket,
    payload: &[u8],
    client_addr: SocketAddr,
    store: &BlocklistStore,
    upstream: SocketAddr,
    sink_v4: std::net::Ipv4Addr,
) {
    let qname = codec::parse_qname(payload);

    if let Some(qname) = qname.as_deref() {
        if store.is_blocked(qname) {
            let response = codec::synthesize_block_response(payload, sink_v4);
            if let Err(err) = socket.send_to(&response, client_addr).await {
                log::warn!("failed to send block response to {client_addr}: {err}");
            }
            return;
        }
    }

    // Non-blocked, or unparseable (a parse failure forwards the
    // datagram rather than blocking it).
    if let Err(err) = forward_to_upstream(socket, payload, client_addr, upstream).await {
        log::debug!("DNS forward to {upstream} for {client_addr} failed: {err}");
    }
}

async fn forward_to_upstream(
    client_socket: &UdpSocket,
    query: &[u8],
    client_addr: SocketAddr,
    upstream: SocketAddr,
) -> std::io::Result<()> {
    let ephemeral = UdpSocket::bind("0.0.0.0:0").await?;
    ephemeral.send_to(query, upstream).await?;

    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let (len, _) = tokio::time::timeout(UPSTREAM_TIMEOUT, ephemeral.recv_from(&mut buf))
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream DNS timeout"))??;

    client_socket.send_to(&buf[..len], client_addr).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::codec::build_query;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn blocked_query_gets_synthesized_answer() {
        let store = BlocklistStore::new();
        // Publish directly via reload from a temp file to exercise the real path.
        let dir = tempfile_blocklist("ads.example.com\n");
        store.reload(dir.path()).await;

        let interceptor = DnsInterceptor::start(
            DnsConfig {
                listen_port: 0,
                blocklist_path: dir.path().to_path_buf(),
                upstream_dns: "127.0.0.1:1".to_string(),
                sink_v4: Ipv4Addr::new(127, 0, 0, 1),
                reload_every: 100,
            },
            store,
        )
        .await
        .unwrap();

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let query = build_query(0xABCD, "ads.example.com");
        client
            .send_to(&query, interceptor.local_addr())
            .await
            .unwrap();

        let mut buf = [0u8; 512];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .expect("expected a reply")
            .unwrap();

        assert_eq!(&buf[2..4], &[0x81, 0x80]);
        assert_eq!(&buf[len - 4..len], &[127, 0, 0, 1]);

        interceptor.stop().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_restart_succeeds() {
        let store = BlocklistStore::new();
        let dir = tempfile_blocklist("");
        let config = DnsConfig {
            listen_port: 0,
            blocklist_path: dir.path().to_path_buf(),
            upstream_dns: "127.0.0.1:1".to_string(),
            sink_v4: Ipv4Addr::new(127, 0, 0, 1),
            reload_every: 100,
        };

        let interceptor = DnsInterceptor::start(config.clone(), store.clone())
            .await
            .unwrap();
        interceptor.stop().await;

        let restarted = DnsInterceptor::start(config, store).await;
        assert!(restarted.is_ok());
        restarted.unwrap().stop().await;
    }

    /// Writes `contents` to a temp file and returns a guard that deletes it
    /// on drop; local to these tests, to avoid pulling in a `tempfile`
    /// crate dependency for a handful of test fixtures.
    struct TempBlocklist {
        path: std::path::PathBuf,
    }

    impl TempBlocklist {
        fn path(&self) -> &std::path::Path {
            &self.path
        }
    }

    impl Drop for TempBlocklist {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    fn tempfile_blocklist(contents: &str) -> TempBlocklist {
        let path = std::env::temp_dir().join(format!(
            "warden-engine-test-{}-{}.txt",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::write(&path, contents).unwrap();
        TempBlocklist { path }
    }
}
