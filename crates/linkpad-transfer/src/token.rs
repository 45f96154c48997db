#![forbid(unsafe_code)]

//! Share token text format.
//!
//! ```text
//! token = base64(tag ‖ payload) with '+' → '-' and '/' → '_'
//! tag   = 0x00 (payload is the raw state buffer)
//!       | 0xFF (payload is a gzip member wrapping the state buffer)
//! ```
//!
//! Encoding keeps `=` padding. Decoding accepts tokens with or without it,
//! since some URL shorteners and chat clients strip trailing `=`.

use std::fmt;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;

/// Standard alphabet, padded output, padding optional on input.
const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Leading byte that says how the payload is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionTag {
    Raw = 0x00,
    Gzip = 0xFF,
}

impl CompressionTag {
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Raw),
            0xFF => Some(Self::Gzip),
            _ => None,
        }
    }
}

/// Why a token could not be split into tag and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Not valid base64 after reversing the URL-safe remap.
    Base64(base64::DecodeError),
    /// Decoded to zero bytes, so there is no tag.
    Empty,
    /// Tag byte other than `0x00` or `0xFF`.
    UnknownTag(u8),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64(err) => write!(f, "token is not valid base64: {err}"),
            Self::Empty => write!(f, "token is empty"),
            Self::UnknownTag(tag) => write!(f, "unknown compression tag 0x{tag:02X}"),
        }
    }
}

impl std::error::Error for TokenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Base64(err) => Some(err),
            _ => None,
        }
    }
}

/// Prefix `payload` with `tag` and render it as URL-safe text.
pub fn encode_tagged(tag: CompressionTag, payload: &[u8]) -> String {
    let mut tagged = Vec::with_capacity(payload.len() + 1);
    tagged.push(tag.as_u8());
    tagged.extend_from_slice(payload);
    to_url_alphabet(ENGINE.encode(&tagged))
}

/// Split a token into its tag and payload bytes.
pub fn decode_tagged(token: &str) -> Result<(CompressionTag, Vec<u8>), TokenError> {
    let standard = from_url_alphabet(token.trim());
    let mut bytes = ENGINE.decode(standard).map_err(TokenError::Base64)?;
    let Some(&tag_byte) = bytes.first() else {
        return Err(TokenError::Empty);
    };
    let tag = CompressionTag::from_u8(tag_byte).ok_or(TokenError::UnknownTag(tag_byte))?;
    bytes.remove(0);
    Ok((tag, bytes))
}

fn to_url_alphabet(standard: String) -> String {
    standard
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect()
}

fn from_url_alphabet(token: &str) -> String {
    token
        .chars()
        .map(|c| match c {
            '_' => '/',
            '-' => '+',
            other => other,
        })
        .collect()
}
