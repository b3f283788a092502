use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub mod chain;
pub mod consensus;
pub mod constants;
pub mod hash;
pub mod pow;
pub mod validate;

pub use chain::{Ledger, TransactionPool};
pub use consensus::{ConsensusResolver, NodeRegistry};
pub use hash::HashAlgorithm;
pub use pow::ProofOfWork;
pub use validate::ChainValidator;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub amount: u64,
}

/// A block as it travels over the wire. `nonce` and `miner_address` are
/// carried for format compatibility and stay empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
    #[serde(default)]
    pub nonce: String,
    #[serde(default)]
    pub miner_address: String,
}

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("invalid chain at block {index}: {reason}")]
    InvalidChain { index: u64, reason: String },

    #[error("chain has no blocks")]
    EmptyChain,

    #[error("invalid node address: {0:?}")]
    InvalidNodeAddress(String),

    #[error("unknown hash algorithm: {0:?}")]
    UnknownAlgorithm(String),

    #[error("canonical serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_serialization_example() {
        let tx = Transaction {
            sender: "alice".to_string(),
            receiver: "bob".to_string(),
            amount: 10,
        };
        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(json, r#"{"sender":"alice","receiver":"bob","amount":10}"#);
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, back);
    }

    #[test]
    fn block_round_trips_through_json() {
        let block = Block {
            index: 2,
            timestamp: 1_600_000_000,
            transactions: vec![Transaction {
                sender: "alice".to_string(),
                receiver: "bob".to_string(),
                amount: 5,
            }],
            proof: 35293,
            previous_hash: "00ab".to_string(),
            nonce: String::new(),
            miner_address: String::new(),
        };
        let json = serde_json::to_string(&block).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(block, back);
    }

    #[test]
    fn block_deserializes_without_optional_fields() {
        let json = r#"{
            "index": 1,
            "timestamp": 1600000000,
            "transactions": [],
            "proof": 100,
            "previous_hash": "1"
        }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.nonce, "");
        assert_eq!(block.miner_address, "");
    }
}
