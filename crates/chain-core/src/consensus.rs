use crate::validate::ChainValidator;
use crate::{Block, ChainError};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Known peer addresses, stored as normalized `host[:port]` authorities.
/// Holds no sockets; callers do the fetching.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: BTreeSet<String>,
}

impl NodeRegistry {
    /// Insert a peer address. Scheme and path are stripped; registering the
    /// same authority twice is a no-op.
    pub fn register(&mut self, address: &str) -> Result<(), ChainError> {
        let authority = normalize_authority(address)?;
        if self.nodes.insert(authority.clone()) {
            info!(%authority, "peer registered");
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn normalize_authority(address: &str) -> Result<String, ChainError> {
    let trimmed = address.trim();
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .unwrap_or(trimmed);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if authority.is_empty() {
        return Err(ChainError::InvalidNodeAddress(address.to_string()));
    }
    Ok(authority.to_string())
}

/// Longest-chain conflict resolution over candidate chains fetched from
/// peers.
#[derive(Clone, Copy, Debug)]
pub struct ConsensusResolver {
    validator: ChainValidator,
}

impl ConsensusResolver {
    pub fn new(validator: ChainValidator) -> Self {
        Self { validator }
    }

    /// Among the candidates the validator accepts, pick the one strictly
    /// longer than the local chain. `None` keeps the local chain; ties keep
    /// the local chain.
    pub fn resolve(&self, local: &[Block], candidates: Vec<Vec<Block>>) -> Option<Vec<Block>> {
        let mut winner: Option<Vec<Block>> = None;
        let mut best_len = local.len();
        for candidate in candidates {
            if candidate.len() <= best_len {
                debug!(
                    length = candidate.len(),
                    local = local.len(),
                    "candidate chain not longer, skipped"
                );
                continue;
            }
            match self.validator.validate(&candidate) {
                Ok(()) => {
                    best_len = candidate.len();
                    winner = Some(candidate);
                }
                Err(err) => debug!(%err, "candidate chain rejected"),
            }
        }
        if let Some(chain) = &winner {
            info!(length = chain.len(), "longer valid chain found");
        }
        winner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Ledger;
    use crate::hash::HashAlgorithm;
    use crate::pow::ProofOfWork;

    fn resolver() -> ConsensusResolver {
        ConsensusResolver::new(ChainValidator::new(ProofOfWork::new(
            HashAlgorithm::Sha256,
            2,
        )))
    }

    fn mined_chain(extra_blocks: usize) -> Vec<Block> {
        let pow = ProofOfWork::new(HashAlgorithm::Sha256, 2);
        let mut ledger = Ledger::new(HashAlgorithm::Sha256);
        for _ in 0..extra_blocks {
            let last_proof = ledger.last_block().unwrap().proof;
            let proof = pow.mine(last_proof);
            ledger.new_block(proof, None).unwrap();
        }
        ledger.blocks().to_vec()
    }

    #[test]
    fn register_normalizes_addresses() {
        let mut registry = NodeRegistry::default();
        registry.register("http://192.168.0.5:5000").unwrap();
        registry.register("https://node.example.com/chain").unwrap();
        registry.register("10.0.0.1:8080").unwrap();
        let nodes: Vec<String> = registry.iter().cloned().collect();
        assert_eq!(nodes, ["10.0.0.1:8080", "192.168.0.5:5000", "node.example.com"]);
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = NodeRegistry::default();
        registry.register("http://192.168.0.5:5000").unwrap();
        registry.register("192.168.0.5:5000/nodes").unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_rejects_unusable_addresses() {
        let mut registry = NodeRegistry::default();
        assert!(matches!(
            registry.register("http://"),
            Err(ChainError::InvalidNodeAddress(_))
        ));
        assert!(registry.register("   ").is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn adopts_a_strictly_longer_valid_chain() {
        let local = mined_chain(1);
        let longer = mined_chain(3);
        let adopted = resolver().resolve(&local, vec![longer.clone()]);
        assert_eq!(adopted, Some(longer));
    }

    #[test]
    fn keeps_local_on_ties_and_shorter_candidates() {
        let local = mined_chain(2);
        let tie = mined_chain(2);
        let shorter = mined_chain(1);
        assert_eq!(resolver().resolve(&local, vec![tie, shorter]), None);
    }

    #[test]
    fn never_adopts_an_invalid_chain() {
        let local = mined_chain(1);
        let mut forged = mined_chain(4);
        forged[2].previous_hash = "deadbeef".to_string();
        assert_eq!(resolver().resolve(&local, vec![forged]), None);
    }

    #[test]
    fn picks_the_longest_among_several_valid_chains() {
        let local = mined_chain(0);
        let short = mined_chain(1);
        let long = mined_chain(3);
        let mid = mined_chain(2);
        let adopted = resolver().resolve(&local, vec![short, long.clone(), mid]);
        assert_eq!(adopted, Some(long));
    }
}
