#![forbid(unsafe_code)]

use std::fmt;

use linkpad_core::CodecError;

use crate::compression::GunzipError;
use crate::fallback::FallbackError;
use crate::token::TokenError;

/// Why a share token could not be turned back into a graph state.
#[derive(Debug)]
pub enum TransferError {
    /// Bad base64, empty buffer, or unknown compression tag.
    InvalidToken(TokenError),
    /// The state buffer itself is malformed.
    CorruptState(CodecError),
    /// Compressed payload could not be inflated, locally or remotely.
    DecompressionFailed(DecompressionFailure),
}

/// Which inflate path failed.
#[derive(Debug)]
pub enum DecompressionFailure {
    Local(GunzipError),
    Remote(FallbackError),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken(err) => write!(f, "invalid share token: {err}"),
            Self::CorruptState(err) => write!(f, "{err}"),
            Self::DecompressionFailed(err) => write!(f, "decompression failed: {err}"),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidToken(err) => Some(err),
            Self::CorruptState(err) => Some(err),
            Self::DecompressionFailed(err) => Some(err),
        }
    }
}

impl fmt::Display for DecompressionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(err) => write!(f, "local: {err}"),
            Self::Remote(err) => write!(f, "remote: {err}"),
        }
    }
}

impl std::error::Error for DecompressionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Local(err) => Some(err),
            Self::Remote(err) => Some(err),
        }
    }
}

impl From<TokenError> for TransferError {
    fn from(err: TokenError) -> Self {
        Self::InvalidToken(err)
    }
}

impl From<CodecError> for TransferError {
    fn from(err: CodecError) -> Self {
        Self::CorruptState(err)
    }
}

/// Failure of [`crate::inflate_token`].
#[derive(Debug)]
pub enum InflateError {
    InvalidToken(TokenError),
    DecompressionFailed(GunzipError),
}

impl fmt::Display for InflateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken(err) => write!(f, "invalid share token: {err}"),
            Self::DecompressionFailed(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for InflateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidToken(err) => Some(err),
            Self::DecompressionFailed(err) => Some(err),
        }
    }
}
