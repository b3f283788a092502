use crate::constants::DEFAULT_DIFFICULTY;
use crate::hash::HashAlgorithm;
use tracing::info;

/// Brute-force proof search plus the difficulty predicate. The same value is
/// handed to the validator so mining and verification can never disagree.
#[derive(Clone, Copy, Debug)]
pub struct ProofOfWork {
    algorithm: HashAlgorithm,
    difficulty: usize,
}

impl ProofOfWork {
    pub fn new(algorithm: HashAlgorithm, difficulty: usize) -> Self {
        Self {
            algorithm,
            difficulty,
        }
    }

    pub fn with_default_difficulty(algorithm: HashAlgorithm) -> Self {
        Self::new(algorithm, DEFAULT_DIFFICULTY)
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// True iff the digest of the concatenated decimal strings
    /// `"{last_proof}{proof}"` starts with `difficulty` zero hex characters.
    pub fn is_valid(&self, last_proof: u64, proof: u64) -> bool {
        let guess = format!("{last_proof}{proof}");
        let digest = self.algorithm.digest_hex(guess.as_bytes());
        digest
            .as_bytes()
            .iter()
            .take(self.difficulty)
            .all(|c| *c == b'0')
    }

    /// Scan proofs upward from zero until the predicate holds; returns the
    /// smallest valid proof. CPU-bound, so keep it off latency-sensitive
    /// paths.
    pub fn mine(&self, last_proof: u64) -> u64 {
        let proof = (0..=u64::MAX)
            .find(|proof| self.is_valid(last_proof, *proof))
            .expect("proof space exhausted (practically impossible)");
        info!(last_proof, proof, "proof of work found");
        proof
    }
}
