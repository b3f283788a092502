use crate::pow::ProofOfWork;
use crate::{Block, ChainError};

/// Walks a candidate chain verifying hash linkage and proof validity for
/// every adjacent pair. The genesis block is exempt.
#[derive(Clone, Copy, Debug)]
pub struct ChainValidator {
    pow: ProofOfWork,
}

impl ChainValidator {
    pub fn new(pow: ProofOfWork) -> Self {
        Self { pow }
    }

    pub fn pow(&self) -> ProofOfWork {
        self.pow
    }

    /// Accepts iff every non-genesis block links to its predecessor's digest
    /// and carries a proof the shared predicate accepts. Stops at the first
    /// violation.
    pub fn validate(&self, blocks: &[Block]) -> Result<(), ChainError> {
        for pair in blocks.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            let expected = self.pow.algorithm().hash_block(prev)?;
            if cur.previous_hash != expected {
                return Err(ChainError::InvalidChain {
                    index: cur.index,
                    reason: "previous_hash does not match the predecessor's digest".to_string(),
                });
            }
            if !self.pow.is_valid(prev.proof, cur.proof) {
                return Err(ChainError::InvalidChain {
                    index: cur.index,
                    reason: "proof does not satisfy the difficulty target".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn is_valid(&self, blocks: &[Block]) -> bool {
        self.validate(blocks).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Ledger;
    use crate::hash::HashAlgorithm;

    fn pow() -> ProofOfWork {
        ProofOfWork::new(HashAlgorithm::Sha256, 2)
    }

    fn mined_chain(pow: &ProofOfWork, extra_blocks: usize) -> Vec<Block> {
        let mut ledger = Ledger::new(pow.algorithm());
        for i in 0..extra_blocks {
            ledger
                .add_transaction("alice", "bob", (i + 1) as u64)
                .unwrap();
            let last_proof = ledger.last_block().unwrap().proof;
            let proof = pow.mine(last_proof);
            ledger.new_block(proof, None).unwrap();
        }
        ledger.blocks().to_vec()
    }

    #[test]
    fn trivial_chains_are_valid() {
        let validator = ChainValidator::new(pow());
        assert!(validator.is_valid(&[]));
        let genesis_only = mined_chain(&pow(), 0);
        assert!(validator.is_valid(&genesis_only));
    }

    #[test]
    fn mined_chain_is_accepted() {
        let validator = ChainValidator::new(pow());
        let chain = mined_chain(&pow(), 3);
        assert!(validator.validate(&chain).is_ok());
        // Linkage holds for every non-genesis block.
        for pair in chain.windows(2) {
            assert_eq!(
                pair[1].previous_hash,
                HashAlgorithm::Sha256.hash_block(&pair[0]).unwrap()
            );
        }
    }

    #[test]
    fn tampered_previous_hash_is_rejected() {
        let validator = ChainValidator::new(pow());
        let mut chain = mined_chain(&pow(), 2);
        chain[2].previous_hash = "0".repeat(64);
        // The proof is still the mined one; the linkage check alone must sink
        // the chain.
        let err = validator.validate(&chain).unwrap_err();
        assert!(matches!(err, ChainError::InvalidChain { index: 3, .. }));
    }

    #[test]
    fn tampered_proof_is_rejected() {
        let pow = pow();
        let validator = ChainValidator::new(pow);
        let mut chain = mined_chain(&pow, 2);
        let bad_proof = (0..u64::MAX)
            .find(|p| !pow.is_valid(chain[0].proof, *p))
            .unwrap();
        chain[1].proof = bad_proof;
        let err = validator.validate(&chain).unwrap_err();
        assert!(matches!(err, ChainError::InvalidChain { index: 2, .. }));
    }

    #[test]
    fn rewriting_history_breaks_downstream_linkage() {
        let validator = ChainValidator::new(pow());
        let mut chain = mined_chain(&pow(), 3);
        chain[1].transactions[0].amount = 1_000_000;
        let err = validator.validate(&chain).unwrap_err();
        assert!(matches!(err, ChainError::InvalidChain { index: 3, .. }));
    }

    #[test]
    fn validator_with_higher_difficulty_rejects_easier_chains() {
        let chain = mined_chain(&ProofOfWork::new(HashAlgorithm::Sha256, 1), 2);
        let strict = ChainValidator::new(ProofOfWork::new(HashAlgorithm::Sha256, 4));
        assert!(!strict.is_valid(&chain));
    }
}
