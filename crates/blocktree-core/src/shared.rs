use crate::admission::Admission;
use crate::block::{Block, BlockId};
use crate::error::Result;
use crate::ledger::{Balances, Ledger};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable handle to one [`Ledger`] shared across threads.
///
/// Mutation takes the write lock; queries take the read lock and never
/// overlap a mutation.
#[derive(Clone, Debug, Default)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    // Insertion follows every check, so a poisoned guard still holds a whole tree.
    fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_block(&self, parent: Option<BlockId>, block: Block) -> Admission {
        self.write().add_block(parent, block)
    }

    pub fn balance(&self, account: &str) -> Result<i64> {
        self.read().balance(account)
    }

    pub fn balances(&self) -> Result<Balances> {
        self.read().balances()
    }

    /// Owned copy of the longest chain.
    pub fn longest_chain(&self) -> Vec<Block> {
        self.read().longest_chain().into_iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the whole tree as of now.
    pub fn snapshot(&self) -> Ledger {
        self.read().clone()
    }
}

impl From<Ledger> for SharedLedger {
    fn from(ledger: Ledger) -> Self {
        Self::new(ledger)
    }
}
