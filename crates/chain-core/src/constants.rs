/// Proof carried by the genesis block; never checked against the target.
pub const GENESIS_PROOF: u64 = 100;
/// Sentinel previous-hash of the genesis block. Out-of-band on purpose:
/// real digests are 64 hex characters.
pub const GENESIS_PREVIOUS_HASH: &str = "1";
/// Leading zero hex characters a valid proof digest must carry.
pub const DEFAULT_DIFFICULTY: usize = 4;
/// Sender recorded on mining-reward transactions.
pub const MINING_SENDER: &str = "0";
pub const MINING_REWARD: u64 = 1;
