//! Block tree ledger engine.
//!
//! Transactions move or create value between named accounts and carry an
//! MD5 integrity checksum over their fields. Blocks batch up to ten valid
//! transactions. The [`Ledger`] keeps blocks in a tree rooted at one genesis
//! block, refuses blocks that would overdraw an account on their chain, and
//! derives balances by replaying the longest root-to-leaf chain.
//!
//! ```
//! use blocktree_core::{Block, Ledger, Transaction};
//!
//! let mut genesis = Block::new(1);
//! let _ = genesis.add_transaction(Transaction::emission(1, "bob", 100)?);
//! let mut ledger = Ledger::new();
//! assert!(ledger.add_block(None, genesis).is_accepted());
//!
//! let mut next = Block::new(2);
//! let _ = next.add_transaction(Transaction::transfer(2, "bob", "alice", 50)?);
//! assert!(ledger.add_block(Some(1), next).is_accepted());
//!
//! assert_eq!(ledger.balance("alice")?, 50);
//! assert_eq!(ledger.balance("bob")?, 50);
//! # Ok::<(), blocktree_core::LedgerError>(())
//! ```

pub mod admission;
pub mod block;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod shared;
pub mod transaction;

pub use admission::{Admission, Rejection};
pub use block::{Block, BlockId};
pub use error::{LedgerError, Result};
pub use ledger::{apply_block, apply_transaction, replay, Balances, Ledger};
pub use shared::SharedLedger;
pub use transaction::{checksum_of, Transaction, TransactionBuilder, TransactionKind, TxId};
