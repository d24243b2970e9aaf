//! # Hex Helpers
//!
//! `0x`-prefixed hex conversions for fixed-width words and addresses, plus
//! serde adapters so hash fields cross JSON boundaries as fixed-length hex.

use super::errors::{Address, Hash, RelayError};

/// Strip an optional `0x`/`0X` prefix.
pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode hex with or without prefix. Odd-length input gets a leading zero nibble.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, RelayError> {
    let body = strip_0x(s);
    let decoded = if body.len() % 2 == 1 {
        hex::decode(format!("0{}", body))
    } else {
        hex::decode(body)
    };
    decoded.map_err(|e| RelayError::InvalidIdentifier(format!("{}: {}", s, e)))
}

/// Parse exactly 32 bytes of hex.
pub fn parse_hash(s: &str) -> Result<Hash, RelayError> {
    let bytes = decode_hex(s)?;
    bytes.as_slice().try_into().map_err(|_| {
        RelayError::InvalidIdentifier(format!("{} is {} bytes, expected 32", s, bytes.len()))
    })
}

/// Parse exactly 20 bytes of hex.
pub fn parse_address(s: &str) -> Result<Address, RelayError> {
    let bytes = decode_hex(s)?;
    bytes.as_slice().try_into().map_err(|_| {
        RelayError::InvalidIdentifier(format!("{} is {} bytes, expected 20", s, bytes.len()))
    })
}

/// Parse a JSON-RPC quantity or short word (`0x1`, `0x00ff`) into a left-padded word.
pub fn parse_word(s: &str) -> Result<Hash, RelayError> {
    let bytes = decode_hex(s)?;
    if bytes.len() > 32 {
        return Err(RelayError::InvalidIdentifier(format!(
            "{} is {} bytes, expected at most 32",
            s,
            bytes.len()
        )));
    }
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

/// Parse a JSON-RPC hex quantity into a u64.
pub fn parse_quantity(s: &str) -> Result<u64, RelayError> {
    let body = strip_0x(s);
    if body.is_empty() {
        return Err(RelayError::InvalidIdentifier(format!("empty quantity: {}", s)));
    }
    u64::from_str_radix(body, 16)
        .map_err(|e| RelayError::InvalidIdentifier(format!("{}: {}", s, e)))
}

/// Render bytes as `0x`-prefixed lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Serde adapter: `Hash` as `0x`-prefixed hex (prefix optional on input).
pub mod serde_hash {
    use super::{parse_hash, to_hex};
    use crate::domain::errors::Hash;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a 32-byte word.
    pub fn serialize<S: Serializer>(value: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(value))
    }

    /// Deserialize a 32-byte word.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hash(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter: `Vec<Hash>` as a list of `0x`-prefixed hex strings.
pub mod serde_hash_vec {
    use super::{parse_hash, to_hex};
    use crate::domain::errors::Hash;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a word list.
    pub fn serialize<S: Serializer>(value: &[Hash], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(value.len()))?;
        for word in value {
            seq.serialize_element(&to_hex(word))?;
        }
        seq.end()
    }

    /// Deserialize a word list.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Hash>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|s| parse_hash(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Serde adapter: optional `Address` as `0x`-prefixed hex.
pub mod serde_opt_address {
    use super::{parse_address, to_hex};
    use crate::domain::errors::Address;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize an optional address.
    pub fn serialize<S: Serializer>(
        value: &Option<Address>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(addr) => serializer.serialize_some(&to_hex(addr)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional address. Empty strings read as absent.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Address>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => parse_address(s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}
