//! # Proof Wire Codec
//!
//! Fixed field order, per layout:
//!
//! ```text
//! SparseMerkle:   (uint64 height, address account, uint256 key, bytes32 value, bytes32[] path, uint64 index)
//! MerklePatricia: (uint64 height, address account, uint256 key, bytes32 value, bytes[] witness,  uint64 index)
//! ```

use super::slot::words;
use crate::domain::{EncodedProof, Hash, ProofLayout, RelayError, StorageProof};
use ethabi::{decode, encode, ParamType, Token, Uint};

/// Head size of the six-field tuple.
const HEAD_LEN: usize = 6 * 32;

/// Word in the head holding the node list offset.
const NODES_OFFSET_AT: usize = 4 * 32;

fn param_types(layout: ProofLayout) -> Vec<ParamType> {
    let node = match layout {
        ProofLayout::SparseMerkle => ParamType::FixedBytes(32),
        ProofLayout::MerklePatricia => ParamType::Bytes,
    };
    vec![
        ParamType::Uint(64),
        ParamType::Address,
        // uint256 key; same word layout, kept as raw bytes
        ParamType::FixedBytes(32),
        ParamType::FixedBytes(32),
        ParamType::Array(Box::new(node)),
        ParamType::Uint(64),
    ]
}

/// Pack a proof and its target height into the wire tuple.
pub fn encode_proof(proof: &StorageProof, height: u64, layout: ProofLayout) -> EncodedProof {
    let nodes = match layout {
        ProofLayout::SparseMerkle => words(&proof.path),
        ProofLayout::MerklePatricia => Token::Array(
            proof
                .witness
                .iter()
                .map(|node| Token::Bytes(node.clone()))
                .collect(),
        ),
    };

    let bytes = encode(&[
        Token::Uint(Uint::from(height)),
        Token::Address(proof.account.into()),
        Token::FixedBytes(proof.key.to_vec()),
        Token::FixedBytes(proof.value.to_vec()),
        nodes,
        Token::Uint(Uint::from(proof.index)),
    ]);

    EncodedProof::new(layout, bytes)
}

/// Unpack a wire tuple. The returned proof's `at_height` is the tuple's height.
pub fn decode_proof(encoded: &EncodedProof) -> Result<StorageProof, RelayError> {
    decode_proof_bytes(encoded.as_bytes(), encoded.layout())
}

/// Unpack raw tuple bytes of a known layout.
///
/// Stricter than plain ABI decoding: the address word must be zero-padded,
/// the uint fields must fit in 64 bits and the node list must start past
/// the head.
pub fn decode_proof_bytes(bytes: &[u8], layout: ProofLayout) -> Result<StorageProof, RelayError> {
    if bytes.len() < HEAD_LEN {
        return Err(RelayError::InvalidEncoding(format!(
            "tuple is {} bytes, head alone needs {}",
            bytes.len(),
            HEAD_LEN
        )));
    }
    if bytes[32..44].iter().any(|b| *b != 0) {
        return Err(RelayError::InvalidEncoding(
            "address word has non-zero padding".to_string(),
        ));
    }
    let nodes_offset = Uint::from_big_endian(&bytes[NODES_OFFSET_AT..NODES_OFFSET_AT + 32]);
    if nodes_offset < Uint::from(HEAD_LEN as u64) {
        return Err(RelayError::InvalidEncoding(format!(
            "node list offset {} points into the head",
            nodes_offset
        )));
    }

    let tokens = decode(&param_types(layout), bytes)
        .map_err(|e| RelayError::InvalidEncoding(format!("proof tuple: {}", e)))?;
    let mut tokens = tokens.into_iter();

    let at_height = next_u64(&mut tokens, "height")?;
    let account = match tokens.next() {
        Some(Token::Address(account)) => account.0,
        _ => return Err(field_error("account")),
    };
    let key = next_word(tokens.next(), "key")?;
    let value = next_word(tokens.next(), "value")?;
    let nodes = match tokens.next() {
        Some(Token::Array(nodes)) => nodes,
        _ => return Err(field_error("nodes")),
    };
    let index = next_u64(&mut tokens, "index")?;

    let (path, witness) = match layout {
        ProofLayout::SparseMerkle => (
            nodes
                .into_iter()
                .map(|node| next_word(Some(node), "path"))
                .collect::<Result<Vec<_>, _>>()?,
            Vec::new(),
        ),
        ProofLayout::MerklePatricia => (
            Vec::new(),
            nodes
                .into_iter()
                .map(|node| match node {
                    Token::Bytes(node) => Ok(node),
                    _ => Err(field_error("witness")),
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };

    Ok(StorageProof {
        account,
        key,
        value,
        path,
        index,
        at_height,
        witness,
    })
}

fn field_error(field: &str) -> RelayError {
    RelayError::InvalidEncoding(format!("unexpected token for {}", field))
}

fn next_u64(tokens: &mut impl Iterator<Item = Token>, field: &str) -> Result<u64, RelayError> {
    match tokens.next() {
        Some(Token::Uint(v)) if v <= Uint::from(u64::MAX) => Ok(v.low_u64()),
        Some(Token::Uint(_)) => Err(RelayError::InvalidEncoding(format!(
            "{} does not fit in 64 bits",
            field
        ))),
        _ => Err(field_error(field)),
    }
}

fn next_word(token: Option<Token>, field: &str) -> Result<Hash, RelayError> {
    match token {
        Some(Token::FixedBytes(bytes)) => bytes.try_into().map_err(|_| field_error(field)),
        _ => Err(field_error(field)),
    }
}
