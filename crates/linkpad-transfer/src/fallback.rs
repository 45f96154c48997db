#![forbid(unsafe_code)]

//! Remote inflate for hosts that cannot decompress locally.
//!
//! The fallback receives the *original* share token and must answer with the
//! inflated state buffer, byte for byte what local gunzip would produce.
//! [`HttpFallback`] talks to the `linkpad-server` endpoint; [`NoFallback`]
//! refuses, which turns a compressed token into a
//! [`DecompressionFailure::Remote`](crate::DecompressionFailure::Remote) error.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use url::Url;

use crate::TOKEN_QUERY_PARAM;

/// Default upper bound on one fallback round trip.
pub const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a remote inflate attempt.
#[derive(Debug)]
pub enum FallbackError {
    /// No fallback is configured.
    Unavailable,
    /// Connection, TLS, or body read failure.
    Transport(reqwest::Error),
    /// The service answered with a non-success status.
    Status(u16),
    /// No answer within the configured timeout.
    Timeout(Duration),
}

impl fmt::Display for FallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "no decompression fallback configured"),
            Self::Transport(err) => write!(f, "fallback request failed: {err}"),
            Self::Status(code) => write!(f, "fallback service answered {code}"),
            Self::Timeout(after) => write!(f, "fallback service timed out after {after:?}"),
        }
    }
}

impl std::error::Error for FallbackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// Something that can turn a compressed share token into the raw state buffer.
pub trait DecompressionFallback {
    fn fetch_inflated(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<u8>, FallbackError>> + Send;
}

/// Fallback that always refuses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl DecompressionFallback for NoFallback {
    async fn fetch_inflated(&self, _token: &str) -> Result<Vec<u8>, FallbackError> {
        Err(FallbackError::Unavailable)
    }
}

/// Where and how long to ask the inflate service.
#[derive(Debug, Clone)]
pub struct HttpFallbackConfig {
    /// Full endpoint URL, e.g. `https://linkpad.example/api/decompress`.
    pub endpoint: Url,
    pub timeout: Duration,
}

impl HttpFallbackConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout: DEFAULT_FALLBACK_TIMEOUT,
        }
    }
}

/// `GET {endpoint}?data={token}` over reqwest.
#[derive(Debug, Clone)]
pub struct HttpFallback {
    client: reqwest::Client,
    config: HttpFallbackConfig,
}

impl HttpFallback {
    pub fn new(config: HttpFallbackConfig) -> Result<Self, FallbackError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(FallbackError::Transport)?;
        Ok(Self { client, config })
    }

    /// Request URL for `token`.
    pub fn request_url(&self, token: &str) -> Url {
        let mut url = self.config.endpoint.clone();
        url.query_pairs_mut().append_pair(TOKEN_QUERY_PARAM, token);
        url
    }

    fn classify(&self, err: reqwest::Error) -> FallbackError {
        if err.is_timeout() {
            FallbackError::Timeout(self.config.timeout)
        } else {
            FallbackError::Transport(err)
        }
    }
}

impl DecompressionFallback for HttpFallback {
    async fn fetch_inflated(&self, token: &str) -> Result<Vec<u8>, FallbackError> {
        let url = self.request_url(token);
        tracing::debug!(
            endpoint = %self.config.endpoint,
            token_len = token.len(),
            "requesting remote inflate"
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.classify(err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FallbackError::Status(status.as_u16()));
        }
        let body = response.bytes().await.map_err(|err| self.classify(err))?;
        Ok(body.to_vec())
    }
}
