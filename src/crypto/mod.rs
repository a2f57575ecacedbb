//! Cryptographic operations for libp2p identity generation.
//!
//! This module provides:
//! - Ed25519 and secp256k1 keypair generation
//! - libp2p protobuf key marshalling
//! - Peer ID derivation and its base58 / base36 CID encodings

pub mod encoding;
mod keypair;
mod peer_id;

pub use keypair::{KeyType, Keypair};
pub use peer_id::PeerId;

/// Errors decoding key material.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Unsupported key type: {0}")]
    Unsupported(String),
    #[error("Invalid {key_type} key length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        key_type: KeyType,
        expected: usize,
        actual: usize,
    },
    #[error("Malformed key: {0}")]
    Malformed(String),
}
