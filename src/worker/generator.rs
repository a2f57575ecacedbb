//! Candidate generation.

use crate::crypto::{KeyError, KeyType, Keypair};

/// One attempted identity.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Marshalled private key.
    pub key_material: Vec<u8>,
    /// Encoding the suffixes are matched against.
    pub canonical_string: String,
}

/// Source of fresh candidates.
///
/// Called concurrently by every worker. Errors are treated as transient: the
/// worker drops them and calls again.
pub trait CandidateGenerator: Send + Sync {
    fn generate(&self) -> Result<Candidate, GenerateError>;
}

impl<F> CandidateGenerator for F
where
    F: Fn() -> Result<Candidate, GenerateError> + Send + Sync,
{
    fn generate(&self) -> Result<Candidate, GenerateError> {
        self()
    }
}

/// Generates libp2p identities whose canonical string is the base36 CID.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeerKeyGenerator {
    key_type: KeyType,
}

impl PeerKeyGenerator {
    pub fn new(key_type: KeyType) -> Self {
        Self { key_type }
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }
}

impl CandidateGenerator for PeerKeyGenerator {
    #[inline]
    fn generate(&self) -> Result<Candidate, GenerateError> {
        let keypair = Keypair::generate(self.key_type);
        Ok(Candidate {
            canonical_string: keypair.peer_id().to_base36_cid(),
            key_material: keypair.to_protobuf(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("Generation failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_key_candidate() {
        let generator = PeerKeyGenerator::new(KeyType::Ed25519);
        let candidate = generator.generate().unwrap();

        assert!(candidate.canonical_string.starts_with('k'));
        let keypair = Keypair::from_protobuf(&candidate.key_material).unwrap();
        assert_eq!(keypair.peer_id().to_base36_cid(), candidate.canonical_string);
    }

    #[test]
    fn test_candidates_are_fresh() {
        let generator = PeerKeyGenerator::default();
        let a = generator.generate().unwrap();
        let b = generator.generate().unwrap();
        assert_ne!(a.canonical_string, b.canonical_string);
    }

    #[test]
    fn test_closure_generator() {
        let generator = || -> Result<Candidate, GenerateError> {
            Err(GenerateError::Failed("entropy unavailable".into()))
        };
        assert!(generator.generate().is_err());
    }
}
