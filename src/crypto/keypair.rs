//! libp2p keypair generation and (un)marshalling.

use std::fmt;
use std::str::FromStr;

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};

use super::encoding::{read_fields, write_bytes_field, write_varint_field, FieldValue};
use super::{KeyError, PeerId};

/// Supported key algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyType {
    #[default]
    Ed25519,
    Secp256k1,
}

impl KeyType {
    /// The `KeyType` enum value used in libp2p key protobufs.
    pub const fn proto_id(self) -> u64 {
        match self {
            KeyType::Ed25519 => 1,
            KeyType::Secp256k1 => 2,
        }
    }

    fn from_proto_id(id: u64) -> Result<Self, KeyError> {
        match id {
            1 => Ok(KeyType::Ed25519),
            2 => Ok(KeyType::Secp256k1),
            0 => Err(KeyError::Unsupported("rsa".into())),
            3 => Err(KeyError::Unsupported("ecdsa".into())),
            other => Err(KeyError::Unsupported(format!("key type #{}", other))),
        }
    }
}

impl FromStr for KeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ed25519" => Ok(KeyType::Ed25519),
            "secp256k1" => Ok(KeyType::Secp256k1),
            "rsa" | "ecdsa" => Err(format!("Unsupported key type: {}", s)),
            _ => Err(format!("Unknown key type: {}", s)),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Ed25519 => write!(f, "ed25519"),
            KeyType::Secp256k1 => write!(f, "secp256k1"),
        }
    }
}

/// A libp2p identity keypair.
#[derive(Clone)]
pub enum Keypair {
    Ed25519(SigningKey),
    Secp256k1 { secret: SecretKey, public: PublicKey },
}

impl Keypair {
    /// Generates a new random keypair of the given type.
    pub fn generate(key_type: KeyType) -> Self {
        match key_type {
            KeyType::Ed25519 => Keypair::Ed25519(SigningKey::generate(&mut OsRng)),
            KeyType::Secp256k1 => {
                let secp = Secp256k1::new();
                let (secret, public) = secp.generate_keypair(&mut rand::thread_rng());
                Keypair::Secp256k1 { secret, public }
            }
        }
    }

    /// Decodes a key from its raw private bytes.
    ///
    /// Ed25519 expects 64 bytes (secret followed by public). The 96 byte legacy
    /// layout, which repeats the public key, is also accepted.
    /// Secp256k1 expects the 32 byte secret scalar.
    pub fn from_raw(key_type: KeyType, bytes: &[u8]) -> Result<Self, KeyError> {
        match key_type {
            KeyType::Ed25519 => {
                let pair = match bytes.len() {
                    64 => bytes,
                    96 if bytes[64..] == bytes[32..64] => &bytes[..64],
                    96 => return Err(KeyError::Malformed("redundant public key mismatch".into())),
                    n => {
                        return Err(KeyError::InvalidLength {
                            key_type,
                            expected: 64,
                            actual: n,
                        })
                    }
                };
                let pair: &[u8; 64] = pair
                    .try_into()
                    .map_err(|_| KeyError::Malformed("ed25519 key slice".into()))?;

                let signing = SigningKey::from_keypair_bytes(pair)
                    .map_err(|e| KeyError::Malformed(e.to_string()))?;
                Ok(Keypair::Ed25519(signing))
            }
            KeyType::Secp256k1 => {
                if bytes.len() != 32 {
                    return Err(KeyError::InvalidLength {
                        key_type,
                        expected: 32,
                        actual: bytes.len(),
                    });
                }
                let secret = SecretKey::from_slice(bytes)
                    .map_err(|e| KeyError::Malformed(e.to_string()))?;
                let public = PublicKey::from_secret_key(&Secp256k1::new(), &secret);
                Ok(Keypair::Secp256k1 { secret, public })
            }
        }
    }

    /// Decodes a marshalled libp2p `PrivateKey` protobuf.
    pub fn from_protobuf(bytes: &[u8]) -> Result<Self, KeyError> {
        let mut key_type = None;
        let mut data = None;

        for (field, value) in read_fields(bytes)? {
            match (field, value) {
                (1, FieldValue::Varint(id)) => key_type = Some(KeyType::from_proto_id(id)?),
                (2, FieldValue::Bytes(b)) => data = Some(b),
                _ => {}
            }
        }

        match (key_type, data) {
            (Some(key_type), Some(data)) => Self::from_raw(key_type, data),
            (None, _) => Err(KeyError::Malformed("missing key type".into())),
            (_, None) => Err(KeyError::Malformed("missing key data".into())),
        }
    }

    /// Returns the key algorithm.
    pub fn key_type(&self) -> KeyType {
        match self {
            Keypair::Ed25519(_) => KeyType::Ed25519,
            Keypair::Secp256k1 { .. } => KeyType::Secp256k1,
        }
    }

    /// Returns the raw private key bytes in the layout [`Keypair::from_raw`] reads.
    pub fn private_key_bytes(&self) -> Vec<u8> {
        match self {
            Keypair::Ed25519(signing) => signing.to_keypair_bytes().to_vec(),
            Keypair::Secp256k1 { secret, .. } => secret.secret_bytes().to_vec(),
        }
    }

    /// Returns the raw public key bytes (compressed for secp256k1).
    pub fn public_key_bytes(&self) -> Vec<u8> {
        match self {
            Keypair::Ed25519(signing) => signing.verifying_key().to_bytes().to_vec(),
            Keypair::Secp256k1 { public, .. } => public.serialize().to_vec(),
        }
    }

    /// Marshals the private key as a libp2p `PrivateKey` protobuf.
    pub fn to_protobuf(&self) -> Vec<u8> {
        let data = self.private_key_bytes();
        let mut out = Vec::with_capacity(data.len() + 4);
        write_varint_field(&mut out, 1, self.key_type().proto_id());
        write_bytes_field(&mut out, 2, &data);
        out
    }

    /// Marshals the public key as a libp2p `PublicKey` protobuf.
    pub fn public_key_protobuf(&self) -> Vec<u8> {
        let data = self.public_key_bytes();
        let mut out = Vec::with_capacity(data.len() + 4);
        write_varint_field(&mut out, 1, self.key_type().proto_id());
        write_bytes_field(&mut out, 2, &data);
        out
    }

    /// Derives the peer ID for this keypair.
    pub fn peer_id(&self) -> PeerId {
        PeerId::from_public_key_protobuf(&self.public_key_protobuf())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("key_type", &self.key_type())
            .field("peer_id", &self.peer_id().to_base58())
            .finish_non_exhaustive()
    }
}
