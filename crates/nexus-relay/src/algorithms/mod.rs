//! # Algorithms Module
//!
//! Pure functions: slot derivation, identifier padding and the proof wire
//! codec. ABI encoding goes through `ethabi`. No I/O.

pub mod identifier;
pub mod proof_codec;
pub mod slot;

pub use identifier::{pad_identifier, pad_identifiers};
pub use proof_codec::{decode_proof, decode_proof_bytes, encode_proof};
pub use slot::{
    calculate_storage_slot, encode_receipt, keccak256, receipt_digest, MESSAGES_MAPPING_SLOT,
};
