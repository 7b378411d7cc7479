//! The block tree: admission, longest-chain selection and balance replay.

use crate::admission::{Admission, Rejection};
use crate::block::{Block, BlockId};
use crate::constants::MAX_QUERY_ACCOUNT_LEN;
use crate::error::{LedgerError, Result};
use crate::transaction::{check_account, Transaction};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Net balance per account, ordered by account name.
pub type Balances = BTreeMap<String, i64>;

#[derive(Clone, Debug)]
struct Node {
    block: Block,
    /// `None` for the root.
    parent: Option<BlockId>,
    /// Child ids in insertion order.
    children: Vec<BlockId>,
    /// Number of edges from the root.
    depth: usize,
}

/// A tree of blocks rooted at a single genesis block.
///
/// The tree only grows. Every admitted block has a unique id, a parent that
/// was already present (or is the root), and keeps every account at or above
/// zero after each of its transactions on the chain from the root to itself.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    nodes: HashMap<BlockId, Node>,
    root: Option<BlockId>,
}

/// Credits `to` and debits `from`. On overflow `balances` is left untouched.
pub fn apply_transaction(balances: &mut Balances, tx: &Transaction) -> Result<()> {
    let amount = i64::try_from(tx.amount())
        .map_err(|_| LedgerError::BalanceOverflow(tx.to().to_string()))?;
    let balance_of = |account: &str| balances.get(account).copied().unwrap_or(0);

    let to = balance_of(tx.to())
        .checked_add(amount)
        .ok_or_else(|| LedgerError::BalanceOverflow(tx.to().to_string()))?;
    let from = match tx.from() {
        Some(account) => {
            let debited = balance_of(account)
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::BalanceOverflow(account.to_string()))?;
            Some((account, debited))
        }
        None => None,
    };

    balances.insert(tx.to().to_string(), to);
    if let Some((account, debited)) = from {
        balances.insert(account.to_string(), debited);
    }
    Ok(())
}

/// Replays every transaction of `block` on top of `balances`.
pub fn apply_block(balances: &mut Balances, block: &Block) -> Result<()> {
    for tx in block.transactions() {
        apply_transaction(balances, tx)?;
    }
    Ok(())
}

/// Balances after replaying `chain` in order.
pub fn replay<'a>(chain: impl IntoIterator<Item = &'a Block>) -> Result<Balances> {
    let mut balances = Balances::new();
    for block in chain {
        apply_block(&mut balances, block)?;
    }
    Ok(balances)
}

fn overflow(block_id: BlockId, err: LedgerError) -> Rejection {
    let account = match err {
        LedgerError::BalanceOverflow(account) => account,
        other => other.to_string(),
    };
    Rejection::BalanceOverflow { block_id, account }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&Block> {
        self.root.and_then(|id| self.get_block(id))
    }

    pub fn get_block(&self, id: BlockId) -> Option<&Block> {
        self.nodes.get(&id).map(|node| &node.block)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn parent_of(&self, id: BlockId) -> Option<BlockId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    pub fn children_of(&self, id: BlockId) -> &[BlockId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Distance from the root; the root is at depth 0.
    pub fn depth_of(&self, id: BlockId) -> Option<usize> {
        self.nodes.get(&id).map(|node| node.depth)
    }

    /// A block is admissible on its own if it is non-empty and its id is not
    /// yet in the tree.
    pub fn validate_block(&self, block: &Block) -> bool {
        self.check_block(block).is_ok()
    }

    /// Insert `block` under `parent`, or as the root when `parent` is `None`.
    pub fn add_block(&mut self, parent: Option<BlockId>, block: Block) -> Admission {
        let depth = match self.admit(parent, &block) {
            Ok(depth) => depth,
            Err(reason) => {
                debug!(block = block.id(), ?parent, %reason, "block rejected");
                return Admission::Rejected(reason);
            }
        };

        let id = block.id();
        match parent {
            Some(parent_id) => {
                if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                    parent_node.children.push(id);
                }
            }
            None => self.root = Some(id),
        }
        self.nodes.insert(
            id,
            Node {
                block,
                parent,
                children: Vec::new(),
                depth,
            },
        );
        info!(block = id, ?parent, depth, blocks = self.nodes.len(), "block added");
        Admission::Accepted
    }

    /// Blocks from the root to the deepest leaf. Among leaves of equal depth
    /// the first one reached by a depth-first walk over children in
    /// insertion order wins. Empty when the tree is.
    pub fn longest_chain(&self) -> Vec<&Block> {
        let Some(root) = self.root else {
            return Vec::new();
        };

        let mut best = (root, 0);
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if node.children.is_empty() && node.depth > best.1 {
                best = (id, node.depth);
            }
            stack.extend(node.children.iter().rev());
        }

        self.path_to(best.0)
    }

    /// Balance of `account` on the longest chain; zero if it never appears.
    pub fn balance(&self, account: &str) -> Result<i64> {
        check_account(account, MAX_QUERY_ACCOUNT_LEN)?;
        let balances = replay(self.longest_chain())?;
        Ok(balances.get(account).copied().unwrap_or(0))
    }

    /// Every account touched by the longest chain with its balance.
    pub fn balances(&self) -> Result<Balances> {
        replay(self.longest_chain())
    }

    /// Blocks from the root down to `id`, root first.
    pub fn path_to(&self, id: BlockId) -> Vec<&Block> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(&current) else {
                break;
            };
            path.push(&node.block);
            cursor = node.parent;
        }
        path.reverse();
        path
    }

    fn check_block(&self, block: &Block) -> std::result::Result<(), Rejection> {
        if block.is_empty() {
            return Err(Rejection::EmptyBlock {
                block_id: block.id(),
            });
        }
        if self.contains(block.id()) {
            return Err(Rejection::DuplicateBlock {
                block_id: block.id(),
            });
        }
        Ok(())
    }

    /// Runs every admission check and returns the depth the block would get.
    fn admit(&self, parent: Option<BlockId>, block: &Block) -> std::result::Result<usize, Rejection> {
        self.check_block(block)?;

        let (mut balances, depth) = match parent {
            None if self.root.is_some() => {
                return Err(Rejection::RootExists {
                    block_id: block.id(),
                });
            }
            None => (Balances::new(), 0),
            Some(parent_id) => {
                let parent_node = self.nodes.get(&parent_id).ok_or(Rejection::UnknownParent {
                    block_id: block.id(),
                    parent_id,
                })?;
                let balances = replay(self.path_to(parent_id))
                    .map_err(|err| overflow(block.id(), err))?;
                (balances, parent_node.depth + 1)
            }
        };

        // Only debits lower a balance, so checking `from` after each
        // transaction covers every intermediate state of the chain.
        for tx in block.transactions() {
            apply_transaction(&mut balances, tx).map_err(|err| overflow(block.id(), err))?;
            if let Some(from) = tx.from() {
                let balance = balances.get(from).copied().unwrap_or(0);
                if balance < 0 {
                    return Err(Rejection::NegativeBalance {
                        block_id: block.id(),
                        account: from.to_string(),
                        balance,
                    });
                }
            }
        }
        Ok(depth)
    }
}
