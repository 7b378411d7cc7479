#![allow(dead_code)]

use blocktree_core::{Block, BlockId, Ledger, Transaction};

pub fn block_of(id: BlockId, txs: Vec<Transaction>) -> Block {
    let mut block = Block::new(id);
    for tx in txs {
        assert!(
            block.add_transaction(tx).is_accepted(),
            "fixture transaction should be admitted"
        );
    }
    block
}

pub fn emission_block(id: BlockId, to: &str, amount: i64) -> Block {
    block_of(
        id,
        vec![Transaction::emission(id, to, amount).expect("valid emission")],
    )
}

pub fn transfer_block(id: BlockId, from: &str, to: &str, amount: i64) -> Block {
    block_of(
        id,
        vec![Transaction::transfer(id, from, to, amount).expect("valid transfer")],
    )
}

/// Genesis emits 100 to bob, block 2 moves 50 from bob to alice.
pub fn bob_and_alice() -> Ledger {
    let mut ledger = Ledger::new();
    assert!(ledger.add_block(None, emission_block(1, "bob", 100)).is_accepted());
    assert!(ledger
        .add_block(Some(1), transfer_block(2, "bob", "alice", 50))
        .is_accepted());
    ledger
}

pub fn chain_ids(ledger: &Ledger) -> Vec<BlockId> {
    ledger.longest_chain().iter().map(|b| b.id()).collect()
}
