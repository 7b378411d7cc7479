use std::fmt;

use crate::{BlockId, TxId};

/// Outcome of a best-effort admission into a [`Block`](crate::Block) or the
/// [`Ledger`](crate::Ledger). A rejection leaves the target untouched.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Accepted,
    Rejected(Rejection),
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted)
    }

    pub fn is_rejected(&self) -> bool {
        !self.is_accepted()
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Admission::Accepted => None,
            Admission::Rejected(reason) => Some(reason),
        }
    }
}

impl From<Rejection> for Admission {
    fn from(reason: Rejection) -> Self {
        Admission::Rejected(reason)
    }
}

/// Why a transaction or block was not admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    InvalidChecksum { tx_id: TxId },
    BlockFull { capacity: usize },
    DuplicateTransaction { tx_id: TxId },
    EmptyBlock { block_id: BlockId },
    DuplicateBlock { block_id: BlockId },
    RootExists { block_id: BlockId },
    UnknownParent { block_id: BlockId, parent_id: BlockId },
    NegativeBalance { block_id: BlockId, account: String, balance: i64 },
    BalanceOverflow { block_id: BlockId, account: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::InvalidChecksum { tx_id } => {
                write!(f, "transaction {tx_id} fails checksum validation")
            }
            Rejection::BlockFull { capacity } => {
                write!(f, "block already holds {capacity} transactions")
            }
            Rejection::DuplicateTransaction { tx_id } => {
                write!(f, "transaction {tx_id} already in block")
            }
            Rejection::EmptyBlock { block_id } => write!(f, "block {block_id} has no transactions"),
            Rejection::DuplicateBlock { block_id } => {
                write!(f, "block {block_id} already in tree")
            }
            Rejection::RootExists { block_id } => {
                write!(f, "block {block_id} has no parent but the tree already has a root")
            }
            Rejection::UnknownParent {
                block_id,
                parent_id,
            } => write!(f, "parent {parent_id} of block {block_id} not found"),
            Rejection::NegativeBalance {
                block_id,
                account,
                balance,
            } => write!(
                f,
                "block {block_id} leaves account {account:?} at balance {balance}"
            ),
            Rejection::BalanceOverflow { block_id, account } => {
                write!(f, "block {block_id} overflows the balance of account {account:?}")
            }
        }
    }
}
