//! HTTP Head Parser: reads a request line plus headers up to the first
//! blank line, extracting `method`, `request-target` and the `Host`
//! header value.
//!
//! The parser accumulates bytes from an `AsyncRead` stream until
//! `\r\n\r\n` appears, aborting if the accumulated head would exceed
//! [`MAX_HEAD_SIZE`]. The raw head bytes are preserved verbatim (for
//! forwarding to the origin on a non-`CONNECT` request).

use tokio::io::{AsyncRead, AsyncReadExt};

/// Upper bound on the accumulated request head (request line + headers).
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

/// A parsed HTTP/1.x request head.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: String,
    pub target: String,
    pub host: Option<String>,
    /// The raw bytes read, through and including the terminating
    /// `\r\n\r\n`, preserved for verbatim forwarding.
    pub raw: Vec<u8>,
}

/// Read and parse an HTTP request head from `stream`.
///
/// Returns `None` if the stream hits EOF before a full head arrives, the
/// head exceeds [`MAX_HEAD_SIZE`], or the request line can't be split
/// into at least a method and a target. Callers treat all three
/// identically: close the connection.
pub async fn read_request_head<S: AsyncRead + Unpin>(stream: &mut S) -> Option<RequestHead> {
    let raw = read_until_double_crlf(stream).await?;
    parse_request_head(&raw)
}

async fn read_until_double_crlf<S: AsyncRead + Unpin>(stream: &mut S) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 512];

    loop {
        if let Some(end) = find_double_crlf(&buf) {
            buf.truncate(end);
            return Some(buf);
        }
        if buf.len() > MAX_HEAD_SIZE {
            return None;
        }

        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn find_double_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|idx| idx + 4)
}

fn parse_request_head(raw: &[u8]) -> Option<RequestHead> {
    let text = std::str::from_utf8(raw).ok()?;
    let mut lines = text.split("\r\n");
    let request_line = lines.next()?;

    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut host = None;
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("host") {
                host = Some(value.trim().to_string());
            }
        }
    }

    Some(RequestHead {
        method,
        target,
        host,
        raw: raw.to_vec(),
    })
}

impl RequestHead {
    /// `true` if `method` is `CONNECT` (case-sensitive per RFC 7231; HTTP
    /// methods are conventionally uppercase).
    pub fn is_connect(&self) -> bool {
        self.method.eq_ignore_ascii_case("CONNECT")
    }

    /// The `Host` header value with any trailing `:port` stripped, or
    /// `None` if no `Host` header was present.
    pub fn host_without_port(&self) -> Option<&str> {
        self.host.as_deref().map(|h| {
            h.rsplit_once(':')
                .map(|(host, _port)| host)
                .unwrap_or(h)
        })
    }
}
