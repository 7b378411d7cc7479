mod helpers;

use blocktree_core::{
    apply_transaction, checksum_of, replay, Admission, Balances, Block, BlockId, Ledger,
    LedgerError, Rejection, SharedLedger, Transaction, TransactionKind,
};
use helpers::{bob_and_alice, block_of, chain_ids, emission_block, transfer_block};
use rand::{rngs::StdRng, Rng, SeedableRng};

#[test]
fn scenario_emission_into_genesis() -> anyhow::Result<()> {
    let mut ledger = Ledger::new();
    let outcome = ledger.add_block(None, emission_block(1, "bob", 100));
    assert_eq!(outcome, Admission::Accepted);
    assert_eq!(ledger.balance("bob")?, 100);
    Ok(())
}

#[test]
fn scenario_transfer_on_top_of_genesis() -> anyhow::Result<()> {
    let ledger = bob_and_alice();
    assert_eq!(ledger.balance("alice")?, 50);
    assert_eq!(ledger.balance("bob")?, 50);
    assert_eq!(chain_ids(&ledger), vec![1, 2]);
    Ok(())
}

#[test]
fn scenario_overdraft_is_refused() -> anyhow::Result<()> {
    let mut ledger = bob_and_alice();
    let outcome = ledger.add_block(Some(2), transfer_block(3, "alice", "bob", 9999));
    assert_eq!(
        outcome.rejection(),
        Some(&Rejection::NegativeBalance {
            block_id: 3,
            account: "alice".into(),
            balance: -9949,
        })
    );
    assert!(!ledger.contains(3));
    assert_eq!(ledger.balance("alice")?, 50);
    assert_eq!(ledger.balance("bob")?, 50);
    Ok(())
}

#[test]
fn scenario_sibling_branches_pick_first() -> anyhow::Result<()> {
    let mut ledger = bob_and_alice();
    assert!(ledger
        .add_block(Some(2), emission_block(3, "carol", 30))
        .is_accepted());
    assert!(ledger
        .add_block(Some(2), transfer_block(4, "alice", "bob", 10))
        .is_accepted());

    assert_eq!(ledger.children_of(2), &[3, 4]);
    assert_eq!(chain_ids(&ledger), vec![1, 2, 3]);
    // block 4 is off the selected chain
    assert_eq!(ledger.balance("alice")?, 50);
    assert_eq!(ledger.balance("carol")?, 30);

    // extending the second sibling makes its branch the longest
    assert!(ledger
        .add_block(Some(4), emission_block(5, "dave", 1))
        .is_accepted());
    assert_eq!(chain_ids(&ledger), vec![1, 2, 4, 5]);
    assert_eq!(ledger.balance("alice")?, 40);
    assert_eq!(ledger.balance("bob")?, 60);
    assert_eq!(ledger.balance("carol")?, 0);
    Ok(())
}

#[test]
fn rejected_inserts_leave_shape_unchanged() {
    let mut ledger = bob_and_alice();
    let before = chain_ids(&ledger);

    assert!(ledger.add_block(None, emission_block(9, "eve", 5)).is_rejected());
    assert!(ledger
        .add_block(Some(77), emission_block(10, "eve", 5))
        .is_rejected());
    assert!(ledger.add_block(Some(2), Block::new(11)).is_rejected());
    assert!(ledger
        .add_block(Some(1), emission_block(2, "eve", 5))
        .is_rejected());

    assert_eq!(ledger.len(), 2);
    assert_eq!(chain_ids(&ledger), before);
    assert!(ledger.children_of(2).is_empty());
}

#[test]
fn forged_transaction_never_reaches_the_tree() -> anyhow::Result<()> {
    let honest = Transaction::emission(1, "bob", 100)?;
    let mut json: serde_json::Value = serde_json::to_value(&honest)?;
    json["amount"] = serde_json::json!(1_000_000);
    let forged: Transaction = serde_json::from_value(json)?;

    let mut block = Block::new(1);
    assert_eq!(
        block.add_transaction(forged),
        Admission::Rejected(Rejection::InvalidChecksum { tx_id: 1 })
    );

    let mut ledger = Ledger::new();
    assert_eq!(
        ledger.add_block(None, block),
        Admission::Rejected(Rejection::EmptyBlock { block_id: 1 })
    );
    assert!(ledger.is_empty());
    Ok(())
}

#[test]
fn amount_above_i64_max_cannot_overdraw() -> anyhow::Result<()> {
    let mut ledger = Ledger::new();
    assert!(ledger
        .add_block(None, emission_block(1, "bob", i64::MAX))
        .is_accepted());

    // a correctly signed transfer of u64::MAX would wrap to -1 as a balance delta
    let checksum = checksum_of(2, TransactionKind::Transfer, Some("bob"), "alice", u64::MAX);
    let huge = Transaction::from_parts(
        2,
        TransactionKind::Transfer,
        Some("bob".into()),
        "alice".into(),
        u64::MAX,
        checksum,
    );
    assert_eq!(huge, Err(LedgerError::AmountOverflow(u64::MAX)));

    let json = serde_json::json!({
        "id": 2,
        "kind": "transfer",
        "from": "bob",
        "to": "alice",
        "amount": u64::MAX,
        "checksum": checksum_of(2, TransactionKind::Transfer, Some("bob"), "alice", u64::MAX),
    });
    assert!(serde_json::from_value::<Transaction>(json).is_err());

    let outcome = ledger.add_block(Some(1), emission_block(2, "bob", 1));
    assert_eq!(
        outcome.rejection(),
        Some(&Rejection::BalanceOverflow {
            block_id: 2,
            account: "bob".into(),
        })
    );
    assert_eq!(ledger.balance("bob")?, i64::MAX);
    assert_eq!(ledger.balance("alice")?, 0);
    Ok(())
}

#[test]
fn emission_with_a_source_is_refused() -> anyhow::Result<()> {
    let ledger = bob_and_alice();
    for to in ["bob", "alice"] {
        let checksum = checksum_of(3, TransactionKind::Emission, Some("bob"), to, 40);
        let forged = Transaction::from_parts(
            3,
            TransactionKind::Emission,
            Some("bob".into()),
            to.into(),
            40,
            checksum.clone(),
        );
        assert_eq!(forged, Err(LedgerError::EmissionWithSource(to.into())));

        let json = serde_json::json!({
            "id": 3,
            "kind": "emission",
            "from": "bob",
            "to": to,
            "amount": 40,
            "checksum": checksum,
        });
        let err = serde_json::from_value::<Transaction>(json).unwrap_err();
        assert!(err.to_string().contains("must not name a source"), "{err}");
    }
    assert_eq!(ledger.balance("bob")?, 50);
    assert_eq!(ledger.balance("alice")?, 50);
    Ok(())
}

const ACCOUNTS: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];

fn random_block(rng: &mut StdRng, id: BlockId) -> Block {
    let mut block = Block::new(id);
    for tx_id in 0..rng.gen_range(0..=12u64) {
        let to = ACCOUNTS[rng.gen_range(0..ACCOUNTS.len())];
        let amount = rng.gen_range(0..60);
        let tx = if rng.gen_bool(0.3) {
            Transaction::emission(tx_id, to, amount)
        } else {
            let from = ACCOUNTS[rng.gen_range(0..ACCOUNTS.len())];
            if from == to {
                continue;
            }
            Transaction::transfer(tx_id, from, to, amount)
        };
        let _ = block.add_transaction(tx.expect("generated fields are valid"));
    }
    block
}

/// Recursive depth-first reference: deepest leaf, first one wins on ties.
fn reference_longest(ledger: &Ledger, id: BlockId) -> Vec<BlockId> {
    let mut best: Vec<BlockId> = Vec::new();
    for &child in ledger.children_of(id) {
        let path = reference_longest(ledger, child);
        if path.len() > best.len() {
            best = path;
        }
    }
    best.insert(0, id);
    best
}

#[test]
fn random_trees_keep_ledger_invariants() {
    for seed in 0..20u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ledger = Ledger::new();
        let mut admitted: Vec<BlockId> = Vec::new();

        for id in 1..=150u64 {
            let parent = if admitted.is_empty() || rng.gen_bool(0.05) {
                None
            } else if rng.gen_bool(0.05) {
                Some(10_000 + id)
            } else {
                Some(admitted[rng.gen_range(0..admitted.len())])
            };
            let block = random_block(&mut rng, id);
            let before = ledger.len();
            match ledger.add_block(parent, block) {
                Admission::Accepted => {
                    admitted.push(id);
                    assert_eq!(ledger.len(), before + 1);
                    assert_eq!(ledger.parent_of(id), parent);
                }
                Admission::Rejected(_) => assert_eq!(ledger.len(), before),
            }
        }

        assert_eq!(ledger.len(), admitted.len());
        let chain = ledger.longest_chain();
        let Some(root) = ledger.root() else {
            assert!(chain.is_empty());
            continue;
        };

        // a root-to-leaf path
        assert_eq!(chain[0].id(), root.id());
        for pair in chain.windows(2) {
            assert_eq!(ledger.parent_of(pair[1].id()), Some(pair[0].id()));
        }
        let tip = chain[chain.len() - 1].id();
        assert!(ledger.children_of(tip).is_empty());

        // at least as long as every other path, with the first-found tie-break
        for &id in &admitted {
            let path = ledger.path_to(id);
            assert!(path.len() <= chain.len());
            let mut balances = Balances::new();
            for tx in path.iter().flat_map(|b| b.transactions()) {
                apply_transaction(&mut balances, tx).unwrap();
                assert!(balances.values().all(|balance| *balance >= 0), "seed {seed}");
            }
            assert_eq!(replay(path).unwrap(), balances);
        }
        let ids: Vec<BlockId> = chain.iter().map(|b| b.id()).collect();
        assert_eq!(ids, reference_longest(&ledger, root.id()), "seed {seed}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_ledger_concurrency() -> anyhow::Result<()> {
    use tokio::task;

    let shared = SharedLedger::default();
    assert!(shared
        .add_block(None, emission_block(1, "bob", 1_000))
        .is_accepted());

    let mut handles = Vec::new();
    for i in 0..50u64 {
        let writer = shared.clone();
        handles.push(task::spawn(async move {
            let block = block_of(
                100 + i,
                vec![Transaction::transfer(i, "bob", "alice", 1).expect("valid transfer")],
            );
            assert!(writer.add_block(Some(1), block).is_accepted());
        }));
        let reader = shared.clone();
        handles.push(task::spawn(async move {
            let bob = reader.balance("bob").expect("valid account");
            assert!(bob == 1_000 || bob == 999, "bob saw {bob}");
            assert!(!reader.longest_chain().is_empty());
        }));
    }
    for handle in handles {
        handle.await?;
    }

    let snapshot = shared.snapshot();
    assert_eq!(snapshot.len(), 51);
    assert_eq!(snapshot.children_of(1).len(), 50);
    assert_eq!(shared.longest_chain().len(), 2);
    assert_eq!(shared.balance("alice")?, 1);
    Ok(())
}
