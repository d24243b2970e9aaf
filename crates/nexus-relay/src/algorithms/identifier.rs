//! # Identifier Padding
//!
//! Identifiers travel as fixed 32-byte words, left-padded with zeros.
//! `0x`-prefixed identifiers are hex-decoded first; anything else is taken as
//! UTF-8. An identifier that does not fit is an error, never a truncation.

use crate::domain::hex::decode_hex;
use crate::domain::{Hash, RelayError, IDENTIFIER_WIDTH};

/// Left-pad an identifier into a 32-byte word.
pub fn pad_identifier(identifier: &str) -> Result<Hash, RelayError> {
    if identifier.is_empty() {
        return Err(RelayError::InvalidIdentifier("empty identifier".to_string()));
    }

    let bytes = if identifier.starts_with("0x") || identifier.starts_with("0X") {
        decode_hex(identifier)?
    } else {
        identifier.as_bytes().to_vec()
    };

    if bytes.len() > IDENTIFIER_WIDTH {
        return Err(RelayError::IdentifierTooLong {
            identifier: identifier.to_string(),
            len: bytes.len(),
        });
    }

    let mut word = [0u8; 32];
    word[IDENTIFIER_WIDTH - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

/// Pad every identifier in a list, failing on the first that does not fit.
pub fn pad_identifiers<S: AsRef<str>>(identifiers: &[S]) -> Result<Vec<Hash>, RelayError> {
    identifiers
        .iter()
        .map(|id| pad_identifier(id.as_ref()))
        .collect()
}
