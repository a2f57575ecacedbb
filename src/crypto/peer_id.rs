//! Peer ID derivation and textual encodings.

use std::fmt;

use super::encoding::{base36_encode, write_varint};

/// Multihash code for the identity "hash".
const MULTIHASH_IDENTITY: u64 = 0x00;
/// CID version emitted by [`PeerId::to_cid_bytes`].
const CID_V1: u64 = 0x01;
/// Multicodec for libp2p public keys.
const CODEC_LIBP2P_KEY: u64 = 0x72;
/// Multibase prefix for lowercase base36.
const MULTIBASE_BASE36: char = 'k';

/// A libp2p peer ID: the multihash of a protobuf-encoded public key.
///
/// Ed25519 and secp256k1 public keys both fit under the 42 byte inlining
/// limit, so the multihash is always the identity multihash.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PeerId {
    multihash: Vec<u8>,
}

impl PeerId {
    /// Builds a peer ID from a marshalled `PublicKey` protobuf.
    pub fn from_public_key_protobuf(public_key: &[u8]) -> Self {
        let mut multihash = Vec::with_capacity(public_key.len() + 2);
        write_varint(&mut multihash, MULTIHASH_IDENTITY);
        write_varint(&mut multihash, public_key.len() as u64);
        multihash.extend_from_slice(public_key);
        Self { multihash }
    }

    /// Returns the raw multihash bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.multihash
    }

    /// Returns the legacy base58btc form (`12D3KooW...` for ed25519).
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.multihash).into_string()
    }

    /// Returns the binary CIDv1 (`libp2p-key` codec) wrapping this peer ID.
    pub fn to_cid_bytes(&self) -> Vec<u8> {
        let mut cid = Vec::with_capacity(self.multihash.len() + 2);
        write_varint(&mut cid, CID_V1);
        write_varint(&mut cid, CODEC_LIBP2P_KEY);
        cid.extend_from_slice(&self.multihash);
        cid
    }

    /// Returns the CIDv1 in multibase base36. This is the canonical string
    /// vanity suffixes are matched against.
    #[inline]
    pub fn to_base36_cid(&self) -> String {
        let mut out = String::with_capacity(64);
        out.push(MULTIBASE_BASE36);
        out.push_str(&base36_encode(&self.to_cid_bytes()));
        out
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.to_base58())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KeyType, Keypair};

    #[test]
    fn test_identity_multihash() {
        let peer = PeerId::from_public_key_protobuf(&[0x08, 0x01]);
        assert_eq!(peer.as_bytes(), &[0x00, 0x02, 0x08, 0x01]);
        assert_eq!(peer.to_cid_bytes(), vec![0x01, 0x72, 0x00, 0x02, 0x08, 0x01]);
    }

    #[test]
    fn test_ed25519_well_known_prefixes() {
        let peer = Keypair::generate(KeyType::Ed25519).peer_id();
        assert!(peer.to_base58().starts_with("12D3KooW"), "{}", peer);
        let cid = peer.to_base36_cid();
        assert!(cid.starts_with("k51qzi5uqu5"), "{}", cid);
    }

    #[test]
    fn test_secp256k1_well_known_prefix() {
        let peer = Keypair::generate(KeyType::Secp256k1).peer_id();
        assert!(peer.to_base58().starts_with("16Uiu2HA"), "{}", peer);
    }

    #[test]
    fn test_canonical_string_alphabet() {
        let cid = Keypair::generate(KeyType::Ed25519).peer_id().to_base36_cid();
        assert!(cid[1..]
            .chars()
            .all(crate::crypto::encoding::is_base36_char));
    }
}
