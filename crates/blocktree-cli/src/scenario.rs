//! JSON scenario files replayed by `blocktree replay`.

use anyhow::{Context, Result};
use blocktree_core::{
    Admission, Balances, Block, BlockId, Ledger, Transaction, TransactionKind, TxId,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An unsigned transaction; the checksum is computed when the block is built.
#[derive(Debug, Deserialize)]
pub struct TxSpec {
    pub id: TxId,
    pub kind: String,
    #[serde(default)]
    pub from: Option<String>,
    pub to: String,
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct BlockSpec {
    pub id: BlockId,
    #[serde(default)]
    pub parent: Option<BlockId>,
    pub transactions: Vec<TxSpec>,
}

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub blocks: Vec<BlockSpec>,
    /// Accounts to report; every account on the longest chain when empty.
    #[serde(default)]
    pub accounts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BlockOutcome {
    pub block: BlockId,
    pub parent: Option<BlockId>,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Transactions the block itself refused.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub blocks: Vec<BlockOutcome>,
    pub longest_chain: Vec<BlockId>,
    pub balances: Balances,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing scenario {}", path.display()))
    }

    /// Build every block, insert it in file order and report the result.
    pub fn run(&self) -> Result<Report> {
        let mut ledger = Ledger::new();
        let mut outcomes = Vec::with_capacity(self.blocks.len());

        for spec in &self.blocks {
            let mut block = Block::new(spec.id);
            let mut dropped = Vec::new();
            for tx_spec in &spec.transactions {
                let tx = build_transaction(tx_spec)
                    .with_context(|| format!("block {} transaction {}", spec.id, tx_spec.id))?;
                if let Admission::Rejected(reason) = block.add_transaction(tx) {
                    dropped.push(reason.to_string());
                }
            }

            let outcome = ledger.add_block(spec.parent, block);
            outcomes.push(BlockOutcome {
                block: spec.id,
                parent: spec.parent,
                accepted: outcome.is_accepted(),
                reason: outcome.rejection().map(ToString::to_string),
                dropped,
            });
        }

        let longest_chain = ledger.longest_chain().iter().map(|b| b.id()).collect();
        let balances = if self.accounts.is_empty() {
            ledger.balances()?
        } else {
            self.accounts
                .iter()
                .map(|account| Ok((account.clone(), ledger.balance(account)?)))
                .collect::<Result<Balances>>()?
        };

        Ok(Report {
            blocks: outcomes,
            longest_chain,
            balances,
        })
    }
}

pub fn build_transaction(spec: &TxSpec) -> Result<Transaction> {
    let kind: TransactionKind = spec.kind.parse()?;
    let mut builder = Transaction::builder();
    builder.id(spec.id).kind(kind);
    if let Some(from) = &spec.from {
        builder.from(from)?;
    }
    builder.to(&spec.to)?.amount(spec.amount)?;
    Ok(builder.build()?)
}
