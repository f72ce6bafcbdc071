//! HTTP transport for artifact and manifest fetches.
//!
//! The [`Transport`] trait abstracts the wire so the download manager and
//! the install pipeline can be tested without network access. The real
//! implementation streams response bodies in 64 KiB chunks, checking the
//! cancellation flag at every chunk.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use thiserror::Error;

use crate::progress::CancelToken;

/// Connect timeout for all requests. Stalled transfers are bounded by
/// the retry policy, not a read timeout.
const CONNECT_TIMEOUT_SECS: u64 = 15;

/// Buffer size for streaming downloads (64 KiB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Headers probed for an artifact hash, in order.
const HASH_HEADERS: [&str; 2] = ["x-checksum-sha256", "etag"];

/// Per-chunk progress callback: (bytes so far, total if known).
pub type ChunkProgress<'a> = &'a (dyn Fn(u64, Option<u64>) + Sync);

/// Transport-level failure.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not reach the host at all. Triggers mirror failover for
    /// distribution-network fetches.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The host answered with a non-success status.
    #[error("request failed with status {0}")]
    Status(u16),

    /// Local filesystem failure while writing the body.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    /// Cancellation observed mid-transfer.
    #[error("transfer cancelled")]
    Cancelled,
}

/// Abstract fetch-and-probe operations over HTTP.
pub trait Transport: Send + Sync {
    /// Fetch `url` into the file at `dest`, creating parent directories.
    ///
    /// Checks `cancel` before starting and at every streamed chunk; a
    /// cancelled fetch stops writing and returns without further work.
    /// Returns the number of bytes written.
    fn fetch(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancelToken,
        on_chunk: Option<ChunkProgress<'_>>,
    ) -> Result<u64, TransportError>;

    /// Issue a metadata probe against `url` and return a hash advertised
    /// in a known header, if any. Surrounding quotes are stripped.
    fn probe_hash(&self, url: &str) -> Result<Option<String>, TransportError>;
}

/// Blocking reqwest-backed transport.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with the default connect timeout.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn fetch(
        &self,
        url: &str,
        dest: &Path,
        cancel: &CancelToken,
        on_chunk: Option<ChunkProgress<'_>>,
    ) -> Result<u64, TransportError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled);
        }

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| classify_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let total = response.content_length();

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(dest)?;
        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut written: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(TransportError::Cancelled);
            }
            let bytes_read = response
                .read(&mut buffer)
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            if bytes_read == 0 {
                break;
            }
            writer.write_all(&buffer[..bytes_read])?;
            written += bytes_read as u64;
            if let Some(cb) = on_chunk {
                cb(written, total);
            }
        }

        writer.flush()?;
        Ok(written)
    }

    fn probe_hash(&self, url: &str) -> Result<Option<String>, TransportError> {
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|e| classify_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        for header in HASH_HEADERS {
            if let Some(value) = response.headers().get(header) {
                if let Ok(raw) = value.to_str() {
                    return Ok(Some(strip_quotes(raw).to_string()));
                }
            }
        }
        Ok(None)
    }
}

fn classify_reqwest(e: &reqwest::Error) -> TransportError {
    if e.is_connect() || e.is_timeout() {
        TransportError::Connect(e.to_string())
    } else if let Some(status) = e.status() {
        TransportError::Status(status.as_u16())
    } else {
        TransportError::Connect(e.to_string())
    }
}

/// Strip one layer of surrounding double quotes, as ETag values carry.
pub(crate) fn strip_quotes(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("\"abc123\""), "abc123");
        assert_eq!(strip_quotes("abc123"), "abc123");
        assert_eq!(strip_quotes(" \"abc\" "), "abc");
        // Unbalanced quotes are left alone.
        assert_eq!(strip_quotes("\"abc"), "\"abc");
    }
}
