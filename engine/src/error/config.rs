//! Configuration errors: malformed CLI-supplied addresses.

/// Errors raised while validating configuration values before an
/// interceptor is started.
#[derive(Debug)]
pub enum ConfigError {
    /// `upstreamDns` was not a valid `host[:port]` string.
    InvalidUpstream(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUpstream(raw) => write!(f, "invalid upstream DNS address: {raw}"),
        }
    }
}

impl std::error::Error for ConfigError {}
