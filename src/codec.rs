//! Encoder and decoder for the Caisse-AP tag-length-value wire format.
//!
//! A message is the plain concatenation of `tag (2 chars) || length
//! (3 decimal digits, zero-padded) || value` fields, ASCII throughout,
//! with the `CZ` version tag forced to the front when present. There is
//! no checksum and no end-of-message marker: the declared lengths are the
//! only framing, so one call decodes exactly one message.

use std::fmt::Write as _;

use thiserror::Error;

use crate::message::{Message, tag};

/// Hard cap of the 3-digit length prefix.
pub const MAX_VALUE_LEN: usize = 999;

/// Bytes of a `tag + length` header.
const HEADER_LEN: usize = 5;

/// Errors raised while encoding a [`Message`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("tag '{tag}' is not exactly 2 characters")]
    InvalidTag { tag: String },

    #[error("tag {tag}: value length {len} outside 1..={MAX_VALUE_LEN}")]
    InvalidValueLength { tag: String, len: usize },

    #[error("tag {tag}: non-ascii data cannot be sent on the wire")]
    NonAscii { tag: String },
}

/// Errors raised while decoding a byte string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("offset {at}: {remaining} bytes left, a tag+length header needs {HEADER_LEN}")]
    IncompleteTag { at: usize, remaining: usize },

    #[error("tag {tag}: length field '{raw}' is not a 3-digit number")]
    MalformedLength { tag: String, raw: String },

    #[error("tag {tag}: value declares {declared} bytes but only {remaining} remain")]
    Truncated {
        tag: String,
        declared: usize,
        remaining: usize,
    },

    #[error("offset {at}: non-ascii byte 0x{byte:02x}")]
    NonAscii { at: usize, byte: u8 },
}

impl DecodeError {
    /// Whether more bytes could turn this failure into a complete message.
    ///
    /// Streaming readers keep accumulating on incomplete errors and treat
    /// everything else as fatal for the connection.
    pub fn is_incomplete(&self) -> bool {
        matches!(
            self,
            DecodeError::IncompleteTag { .. } | DecodeError::Truncated { .. }
        )
    }
}

/// Encode a message, `CZ` first, remaining fields in insertion order.
pub fn encode(message: &Message) -> Result<Vec<u8>, EncodeError> {
    let mut out = String::new();
    if let Some(version) = message.get(tag::VERSION) {
        encode_field(&mut out, tag::VERSION, version)?;
    }
    for (t, v) in message.iter() {
        if t != tag::VERSION {
            encode_field(&mut out, t, v)?;
        }
    }
    Ok(out.into_bytes())
}

fn encode_field(out: &mut String, tag: &str, value: &str) -> Result<(), EncodeError> {
    if tag.chars().count() != 2 {
        return Err(EncodeError::InvalidTag { tag: tag.into() });
    }
    if !tag.is_ascii() || !value.is_ascii() {
        return Err(EncodeError::NonAscii { tag: tag.into() });
    }
    if value.is_empty() || value.len() > MAX_VALUE_LEN {
        return Err(EncodeError::InvalidValueLength {
            tag: tag.into(),
            len: value.len(),
        });
    }
    // Infallible: writing to a String cannot fail.
    let _ = write!(out, "{tag}{:03}{value}", value.len());
    Ok(())
}

/// Decode one message with a single forward scan.
///
/// Later duplicates of a tag overwrite earlier values (mapping semantics,
/// preserved from observed terminal traffic) while keeping the first
/// position.
pub fn decode(bytes: &[u8]) -> Result<Message, DecodeError> {
    if let Some(at) = bytes.iter().position(|b| !b.is_ascii()) {
        return Err(DecodeError::NonAscii {
            at,
            byte: bytes[at],
        });
    }

    let mut message = Message::new();
    let mut at = 0;
    while at < bytes.len() {
        let remaining = bytes.len() - at;
        if remaining < HEADER_LEN {
            return Err(DecodeError::IncompleteTag { at, remaining });
        }
        let tag = ascii_str(&bytes[at..at + 2]);
        let raw_len = &bytes[at + 2..at + HEADER_LEN];
        if raw_len.iter().any(|b| !b.is_ascii_digit()) {
            return Err(DecodeError::MalformedLength {
                tag,
                raw: ascii_str(raw_len),
            });
        }
        let declared = raw_len
            .iter()
            .fold(0usize, |n, b| n * 10 + usize::from(b - b'0'));
        at += HEADER_LEN;
        if declared > bytes.len() - at {
            return Err(DecodeError::Truncated {
                tag,
                declared,
                remaining: bytes.len() - at,
            });
        }
        message.set(tag, ascii_str(&bytes[at..at + declared]));
        at += declared;
    }
    Ok(message)
}

/// Lossless for the ascii-checked slices this module feeds it.
fn ascii_str(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
