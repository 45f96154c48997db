#![forbid(unsafe_code)]

//! gzip wrappers with an output cap.

use std::fmt;
use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

/// Default ceiling on inflated output: 16 MiB, far above any real workspace.
pub const DEFAULT_MAX_INFLATED_LEN: usize = 16 * 1024 * 1024;

/// Failure to inflate a gzip payload.
#[derive(Debug)]
pub enum GunzipError {
    /// Not a gzip stream, bad checksum, or truncated member.
    Io(io::Error),
    /// Output would exceed the configured cap.
    TooLarge { limit: usize },
}

impl fmt::Display for GunzipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "gzip stream is invalid: {err}"),
            Self::TooLarge { limit } => write!(f, "inflated state exceeds {limit} bytes"),
        }
    }
}

impl std::error::Error for GunzipError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::TooLarge { .. } => None,
        }
    }
}

/// Compress `bytes` into a single gzip member.
pub fn gzip(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let capacity = bytes.len() / 2 + 32;
    let mut encoder = GzEncoder::new(Vec::with_capacity(capacity), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Inflate a gzip member, refusing to produce more than `limit` bytes.
pub fn gunzip_bounded(bytes: &[u8], limit: usize) -> Result<Vec<u8>, GunzipError> {
    let decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    decoder
        .take(cap)
        .read_to_end(&mut out)
        .map_err(GunzipError::Io)?;
    if out.len() > limit {
        return Err(GunzipError::TooLarge { limit });
    }
    Ok(out)
}
