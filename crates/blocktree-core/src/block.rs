use crate::admission::{Admission, Rejection};
use crate::constants::MAX_TRANSACTIONS_PER_BLOCK;
use crate::transaction::Transaction;
use serde::Serialize;
use tracing::debug;

pub type BlockId = u64;

/// An ordered batch of at most [`MAX_TRANSACTIONS_PER_BLOCK`] valid
/// transactions with distinct ids. Filled only through
/// [`Block::add_transaction`], so there is no `Deserialize`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Block {
    id: BlockId,
    transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            transactions: Vec::with_capacity(MAX_TRANSACTIONS_PER_BLOCK),
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn set_id(&mut self, id: BlockId) {
        self.id = id;
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn validate_transaction(&self, tx: &Transaction) -> bool {
        tx.is_valid()
    }

    /// Append `tx` if its checksum holds, the block has room and no
    /// transaction with the same id is present. Otherwise the block is left
    /// as it was.
    pub fn add_transaction(&mut self, tx: Transaction) -> Admission {
        let verdict = if !self.validate_transaction(&tx) {
            Some(Rejection::InvalidChecksum { tx_id: tx.id() })
        } else if self.transactions.len() >= MAX_TRANSACTIONS_PER_BLOCK {
            Some(Rejection::BlockFull {
                capacity: MAX_TRANSACTIONS_PER_BLOCK,
            })
        } else if self.transactions.iter().any(|t| t.id() == tx.id()) {
            Some(Rejection::DuplicateTransaction { tx_id: tx.id() })
        } else {
            None
        };

        match verdict {
            Some(reason) => {
                debug!(block = self.id, %reason, "transaction dropped");
                Admission::Rejected(reason)
            }
            None => {
                self.transactions.push(tx);
                Admission::Accepted
            }
        }
    }
}
