//! DNS interceptor errors.
//!
//! Only startup failures are represented here: a bind failure is fatal for
//! the interceptor and is returned from `DnsInterceptor::start`. Per-datagram
//! failures (parse errors, upstream timeouts) are handled locally by the
//! recv loop and are never surfaced as a `DnsError`. They are logged and
//! the datagram is either forwarded or silently dropped, matching the
//! component design's failure semantics.
use crate::error::config::ConfigError;

/// Fatal errors that can occur while starting the DNS interceptor.
#[derive(Debug)]
pub enum DnsError {
    /// The configuration supplied to `start` was invalid.
    Config(ConfigError),
    /// Binding the UDP listening socket failed.
    Bind(std::io::Error),
}

impl std::fmt::Display for DnsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "DNS interceptor configuration error: {err}"),
            Self::Bind(err) => write!(f, "DNS interceptor failed to bind: {err}"),
        }
    }
}

impl std::error::Error for DnsError {}

impl From<ConfigError> for DnsError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<std::io::Error> for DnsError {
    fn from(err: std::io::Error) -> Self {
        Self::Bind(err)
    }
}
