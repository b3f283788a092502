use crate::constants::{GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::hash::HashAlgorithm;
use crate::{unix_now, Block, ChainError, Transaction};
use tracing::info;

/// Unconfirmed transactions, kept in arrival order.
#[derive(Debug, Default)]
pub struct TransactionPool {
    pending: Vec<Transaction>,
}

impl TransactionPool {
    pub fn push(&mut self, tx: Transaction) {
        self.pending.push(tx);
    }

    /// Returns the pending transactions and clears the pool in one step, so a
    /// transaction can neither land in two blocks nor get lost in between.
    pub fn drain(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// The chain plus its pool of unconfirmed transactions. The genesis block
/// exists from construction on; `new_block` is the single mutation point for
/// chain growth.
#[derive(Debug)]
pub struct Ledger {
    blocks: Vec<Block>,
    pool: TransactionPool,
    hasher: HashAlgorithm,
}

impl Ledger {
    pub fn new(hasher: HashAlgorithm) -> Self {
        let genesis = Block {
            index: 1,
            timestamp: unix_now(),
            transactions: Vec::new(),
            proof: GENESIS_PROOF,
            previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
            nonce: String::new(),
            miner_address: String::new(),
        };
        Self {
            blocks: vec![genesis],
            pool: TransactionPool::default(),
            hasher,
        }
    }

    /// Queue a transaction for the next mined block; returns the index of the
    /// block it will land in.
    pub fn add_transaction(
        &mut self,
        sender: &str,
        receiver: &str,
        amount: u64,
    ) -> Result<u64, ChainError> {
        if sender.is_empty() {
            return Err(ChainError::InvalidTransaction(
                "sender must not be empty".to_string(),
            ));
        }
        if receiver.is_empty() {
            return Err(ChainError::InvalidTransaction(
                "receiver must not be empty".to_string(),
            ));
        }
        if amount == 0 {
            return Err(ChainError::InvalidTransaction(
                "amount must be positive".to_string(),
            ));
        }
        let next_index = self.last_block()?.index + 1;
        self.pool.push(Transaction {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
        });
        Ok(next_index)
    }

    /// Append a block holding everything currently pooled. `previous_hash`
    /// defaults to the hash of the current last block.
    pub fn new_block(
        &mut self,
        proof: u64,
        previous_hash: Option<String>,
    ) -> Result<Block, ChainError> {
        let previous_hash = match previous_hash {
            Some(hash) => hash,
            None => self.hasher.hash_block(self.last_block()?)?,
        };
        let block = Block {
            index: self.blocks.len() as u64 + 1,
            timestamp: unix_now(),
            transactions: self.pool.drain(),
            proof,
            previous_hash,
            nonce: String::new(),
            miner_address: String::new(),
        };
        info!(
            index = block.index,
            transactions = block.transactions.len(),
            "block appended"
        );
        self.blocks.push(block.clone());
        Ok(block)
    }

    pub fn last_block(&self) -> Result<&Block, ChainError> {
        self.blocks.last().ok_or(ChainError::EmptyChain)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn pool(&self) -> &TransactionPool {
        &self.pool
    }

    pub fn hasher(&self) -> HashAlgorithm {
        self.hasher
    }

    /// Swap in a chain adopted from a peer. The caller validates first; the
    /// pool is untouched, so pending transactions stay queued.
    pub fn replace(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
    }
}
