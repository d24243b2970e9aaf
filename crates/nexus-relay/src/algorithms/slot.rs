//! # Storage Slot Derivation
//!
//! Solidity mapping layout: the value of `mapping[key]` declared at base slot
//! `p` lives at `keccak256(abi.encode(key, p))`. The mailbox records receipts
//! in such a mapping keyed by the receipt digest, so the slot computed here
//! must match the contract byte for byte or the proof verifies the wrong slot.

use crate::domain::{Hash, Receipt};
use ethabi::{encode, Token, Uint};
use sha3::{Digest, Keccak256};

/// Base slot of the mailbox's messages mapping.
pub const MESSAGES_MAPPING_SLOT: u64 = 0;

/// Compute Keccak256 hash.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// `keccak256(abi.encode(receipt_digest, mapping_slot_index))`.
pub fn calculate_storage_slot(receipt_digest: &Hash, mapping_slot_index: u64) -> Hash {
    keccak256(&encode(&[
        Token::FixedBytes(receipt_digest.to_vec()),
        Token::Uint(Uint::from(mapping_slot_index)),
    ]))
}

/// `keccak256(abi.encode(receipt))` with the receipt as one dynamic struct.
pub fn receipt_digest(receipt: &Receipt) -> Hash {
    keccak256(&encode_receipt(receipt))
}

/// `abi.encode(receipt)` for
/// `(bytes32 appIdFrom, bytes32[] appIdTo, bytes data, bytes32 from, bytes32[] to, uint256 nonce)`.
pub fn encode_receipt(receipt: &Receipt) -> Vec<u8> {
    encode(&[Token::Tuple(vec![
        Token::FixedBytes(receipt.app_id_from().to_vec()),
        words(receipt.app_id_to()),
        Token::Bytes(receipt.data().to_vec()),
        Token::FixedBytes(receipt.from().to_vec()),
        words(receipt.to()),
        Token::Uint(Uint::from(receipt.nonce())),
    ])])
}

/// `bytes32[]` token.
pub(crate) fn words(words: &[Hash]) -> Token {
    Token::Array(words.iter().map(|w| Token::FixedBytes(w.to_vec())).collect())
}
