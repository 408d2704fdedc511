//! Stream interceptor errors.
//!
//! As with the DNS interceptor, only startup failures are represented;
//! per-connection failures (parse errors, upstream connect failures,
//! transient I/O) close that connection and are logged, never propagated.
#[derive(Debug)]
pub enum StreamError {
    /// Binding the TCP listening socket failed.
    Bind(std::io::Error),
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bind(err) => write!(f, "stream interceptor failed to bind: {err}"),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        Self::Bind(err)
    }
}
