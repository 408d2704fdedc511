//! Filter engine: blocklist storage, rule compilation and host matching.
//!
//! This is the policy surface every interceptor consults. A [`BlocklistStore`]
//! holds a normalized set of blocked host names (for [`BlocklistStore::is_blocked`])
//! alongside the raw retained rule lines (for the coarse URL fallback, see
//! [`url_fallback_blocked`]). Reloading swaps in a freshly built snapshot so
//! concurrent readers never observe a half-populated set.

mod rule;

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Default IPv4 address returned in a synthesized block answer.
pub const DEFAULT_SINK_V4: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);

#[derive(Debug, Default)]
struct Snapshot {
    hosts: HashSet<String>,
    rules: Vec<String>,
}

/// In-memory, reload-able set of blocked host names.
///
/// Cloning a `BlocklistStore` is cheap (it shares the underlying `Arc`);
/// every interceptor holds its own clone and reads through it, so a reload
/// triggered by one interceptor is immediately visible to the others.
#[derive(Debug, Clone)]
pub struct BlocklistStore {
    inner: Arc<RwLock<Snapshot>>,
    version: Arc<AtomicU64>,
}

impl Default for BlocklistStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlocklistStore {
    /// An empty store. `is_blocked` on an empty store always returns `false`.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Snapshot::default())),
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Monotonic counter bumped on every successful reload.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Number of normalized host entries currently loaded.
    pub fn len(&self) -> usize {
        self.inner.read().expect("blocklist lock poisoned").hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reload the store from `path`.
    ///
    /// Every non-empty line is kept verbatim (for the URL fallback) and,
    /// unless it is a comment/exception/cosmetic rule, compiled into a
    /// normalized host (for `is_blocked`). A missing or unreadable file is
    /// logged and leaves the store empty; this is non-fatal by design.
    pub async fn reload(&self, path: &Path) {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!(
                    "blocklist file {} not readable ({err}); using an empty blocklist",
                    path.display()
                );
                self.publish(Snapshot::default());
                return;
            }
        };

        let mut hosts = HashSet::new();
        let mut rules = Vec::new();
        for raw_line in contents.split('\n') {
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            if line.is_empty() {
                continue;
            }
            rules.push(line.to_string());
            if let Some(host) = rule::normalize_host(line) {
                hosts.insert(host);
            }
        }

        let host_count = hosts.len();
        self.publish(Snapshot { hosts, rules });
        log::info!("loaded {host_count} blocked host(s) from {}", path.display());
    }

    fn publish(&self, fresh: Snapshot) {
        let mut guard = self.inner.write().expect("blocklist lock poisoned");
        *guard = fresh;
        drop(guard);
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Is `host` blocked, using exact match or label-aligned right-suffix match?
    ///
    /// `ads.example.com` blocks `x.ads.example.com` but not `bads.example.com`:
    /// suffixes are only formed immediately after a `.` in the lowercased host.
    pub fn is_blocked(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }
        let host = host.to_ascii_lowercase();
        let snapshot = self.inner.read().expect("blocklist lock poisoned");
        if snapshot.hosts.is_empty() {
            return false;
        }
        if snapshot.hosts.contains(host.as_str()) {
            return true;
        }
        for (index, byte) in host.bytes().enumerate() {
            if byte == b'.' && snapshot.hosts.contains(&host[index + 1..]) {
                return true;
            }
        }
        false
    }

    /// Coarse last-resort check: does `url` contain any retained rule line
    /// as a substring?
    ///
    /// This is a deliberate, dangerous fallback (false positives are easy to
    /// construct) and is never consulted by the DNS or stream interceptors;
    /// see [`url_fallback_blocked`], the only caller this is meant for.
    pub fn url_fallback_blocked(&self, url: &str) -> bool {
        let snapshot = self.inner.read().expect("blocklist lock poisoned");
        url_fallback_blocked(url, &snapshot.rules)
    }
}

/// Scans `url` against each of `rules`, returning `true` on any substring
/// hit. Comment, exception and cosmetic lines are skipped at call time.
///
/// This mirrors the naive filter-engine fallback flagged as a last resort in
/// the design notes: it is coarse and prone to false positives (a rule line
/// of `ads.` will match `https://panda.shop`), and is intentionally not
/// wired into either interceptor.
pub fn url_fallback_blocked(url: &str, rules: &[String]) -> bool {
    rules.iter().any(|rule| {
        !rule.is_empty()
            && !rule::is_comment(rule)
            && !rule::is_cosmetic(rule)
            && !rule::is_exception(rule)
            && url.contains(rule.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_hosts(hosts: &[&str]) -> BlocklistStore {
        let store = BlocklistStore::new();
        let mut snapshot = Snapshot::default();
        for host in hosts {
            snapshot.hosts.insert(host.to_string());
            snapshot.rules.push(host.to_string());
        }
        store.publish(snapshot);
        store
    }

    #[test]
    fn empty_store_never_blocks() {
        let store = BlocklistStore::new();
        assert!(!store.is_blocked("ads.example.com"));
        assert!(!store.is_blocked(""));
    }

    #[test]
    fn exact_and_subdomain_match_block() {
        let store = store_with_hosts(&["ads.example.com"]);
        assert!(store.is_blocked("ads.example.com"));
        assert!(store.is_blocked("x.ads.example.com"));
        assert!(store.is_blocked("ADS.EXAMPLE.COM"));
    }

    #[test]
    fn label_alignment_prevents_false_positive() {
        let store = store_with_hosts(&["ads.example.com"]);
        assert!(!store.is_blocked("badsexample.com"));
        assert!(!store.is_blocked("xads.example.com"));
    }

    #[test]
    fn url_fallback_is_coarse_and_separate_from_is_blocked() {
        let rules = vec!["ads.".to_string()];
        assert!(url_fallback_blocked("https://panda.shop", &rules));
    }
}
