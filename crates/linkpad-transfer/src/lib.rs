#![forbid(unsafe_code)]

//! Share tokens: graph state packed into a URL query value.
//!
//! # Role in linkpad
//! `linkpad-transfer` sits between the binary codec in `linkpad-core` and
//! anything that carries text: URLs, clipboard, chat. [`TransferEncoder`]
//! turns a [`GraphState`] into a token; [`TransferDecoder`] turns it back,
//! inflating gzip payloads locally or through a [`DecompressionFallback`].
//!
//! # Token layout
//! See [`token`] for the exact text format. Payloads larger than
//! [`TransferConfig::compression_threshold`] are gzipped.
//!
//! # Failure modes
//! - Decoding never mutates caller state on error; [`TransferDecoder::decode_into`]
//!   assigns only after every await has succeeded.
//! - Gzip output is capped at [`TransferConfig::max_inflated_len`].

pub mod compression;
pub mod error;
pub mod fallback;
pub mod token;

use linkpad_core::GraphState;
use linkpad_core::codec;

pub use compression::{DEFAULT_MAX_INFLATED_LEN, GunzipError};
pub use error::{DecompressionFailure, InflateError, TransferError};
pub use fallback::{
    DEFAULT_FALLBACK_TIMEOUT, DecompressionFallback, FallbackError, HttpFallback,
    HttpFallbackConfig, NoFallback,
};
pub use token::{CompressionTag, TokenError};

/// Query parameter that carries a share token.
pub const TOKEN_QUERY_PARAM: &str = "data";

/// Encoded states at or below this many bytes are sent uncompressed.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 64;

/// Knobs shared by encoder and decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    /// Gzip payloads above the threshold.
    pub compress: bool,
    /// Largest state buffer, in bytes, sent raw.
    pub compression_threshold: usize,
    /// Inflate gzip tokens in-process instead of asking the fallback.
    pub local_decompression: bool,
    /// Ceiling for local inflate output.
    pub max_inflated_len: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            compress: true,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            local_decompression: true,
            max_inflated_len: DEFAULT_MAX_INFLATED_LEN,
        }
    }
}

/// State to token.
#[derive(Debug, Clone, Default)]
pub struct TransferEncoder {
    config: TransferConfig,
}

impl TransferEncoder {
    #[must_use]
    pub fn new(config: TransferConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Encode `state` as a URL-safe token.
    ///
    /// Never fails: if gzip cannot be written the raw form is emitted instead.
    pub fn encode(&self, state: &GraphState) -> String {
        let buffer = codec::encode(state);
        let raw_len = buffer.len();

        if self.config.compress && raw_len > self.config.compression_threshold {
            match compression::gzip(&buffer) {
                Ok(packed) => {
                    tracing::debug!(raw_len, packed_len = packed.len(), "encoded gzip token");
                    return token::encode_tagged(CompressionTag::Gzip, &packed);
                }
                Err(err) => {
                    tracing::warn!(error = %err, raw_len, "gzip failed, emitting raw token");
                }
            }
        }

        tracing::debug!(raw_len, "encoded raw token");
        token::encode_tagged(CompressionTag::Raw, &buffer)
    }
}

/// Token to state.
#[derive(Debug, Clone, Default)]
pub struct TransferDecoder<F = NoFallback> {
    config: TransferConfig,
    fallback: F,
}

impl TransferDecoder<NoFallback> {
    /// Decoder without a remote fallback.
    #[must_use]
    pub fn new(config: TransferConfig) -> Self {
        Self {
            config,
            fallback: NoFallback,
        }
    }
}

impl<F: DecompressionFallback> TransferDecoder<F> {
    #[must_use]
    pub fn with_fallback(config: TransferConfig, fallback: F) -> Self {
        Self { config, fallback }
    }

    #[must_use]
    pub const fn config(&self) -> &TransferConfig {
        &self.config
    }

    #[must_use]
    pub const fn fallback(&self) -> &F {
        &self.fallback
    }

    /// Decode `token` into a fresh state.
    pub async fn decode(&self, token: &str) -> Result<GraphState, TransferError> {
        let (tag, payload) = token::decode_tagged(token)?;

        let buffer = match tag {
            CompressionTag::Raw => payload,
            CompressionTag::Gzip if self.config.local_decompression => {
                compression::gunzip_bounded(&payload, self.config.max_inflated_len).map_err(
                    |err| TransferError::DecompressionFailed(DecompressionFailure::Local(err)),
                )?
            }
            CompressionTag::Gzip => {
                tracing::warn!(
                    token_len = token.len(),
                    "local decompression disabled, using fallback"
                );
                self.fallback.fetch_inflated(token).await.map_err(|err| {
                    TransferError::DecompressionFailed(DecompressionFailure::Remote(err))
                })?
            }
        };

        let state = codec::decode(&buffer)?;
        tracing::debug!(
            ?tag,
            buffer_len = buffer.len(),
            nodes = state.nodes.len(),
            "decoded token"
        );
        Ok(state)
    }

    /// Decode `token` and replace `*into` with the result.
    ///
    /// On error `*into` is left exactly as it was.
    pub async fn decode_into(
        &self,
        token: &str,
        into: &mut GraphState,
    ) -> Result<(), TransferError> {
        let decoded = self.decode(token).await?;
        *into = decoded;
        Ok(())
    }
}

/// Undo the token layer and return the raw state buffer.
///
/// This is the shared path for local decoding and the inflate service, so
/// both produce identical bytes for the same token.
pub fn inflate_token(token: &str, limit: usize) -> Result<Vec<u8>, InflateError> {
    let (tag, payload) = token::decode_tagged(token).map_err(InflateError::InvalidToken)?;
    match tag {
        CompressionTag::Raw => Ok(payload),
        CompressionTag::Gzip => {
            compression::gunzip_bounded(&payload, limit).map_err(InflateError::DecompressionFailed)
        }
    }
}
