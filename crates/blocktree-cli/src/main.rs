mod scenario;

use anyhow::Result;
use blocktree_core::{Block, Ledger, Transaction, TransactionKind, TxId};
use clap::{Parser, Subcommand};
use scenario::{Report, Scenario};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "blocktree")]
#[command(about = "Demo harness for the block tree ledger")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Emit 100 to bob, move 50 to alice, print both balances
    Demo,
    /// Replay a JSON scenario of blocks and report balances
    Replay {
        /// Scenario file
        file: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the checksum of a transaction
    Checksum {
        #[arg(long)]
        id: TxId,
        /// emission | transfer (or 0 | 1)
        #[arg(long)]
        kind: TransactionKind,
        /// Source account (ignored for emissions)
        #[arg(long)]
        from: Option<String>,
        /// Destination account
        #[arg(long)]
        to: String,
        #[arg(long, allow_hyphen_values = true)]
        amount: i64,
    },
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Demo => demo()?,
        Command::Replay { file, json } => {
            let report = Scenario::load(&file)?.run()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Command::Checksum {
            id,
            kind,
            from,
            to,
            amount,
        } => {
            let mut builder = Transaction::builder();
            builder.id(id).kind(kind);
            if let Some(from) = from.as_deref() {
                builder.from(from)?;
            }
            let tx = builder.to(&to)?.amount(amount)?.build()?;
            println!("{}", tx.checksum());
        }
    }
    Ok(())
}

fn demo() -> Result<()> {
    let mut ledger = Ledger::new();

    let mut genesis = Block::new(1);
    let _ = genesis.add_transaction(Transaction::emission(1, "bob", 100)?);
    let outcome = ledger.add_block(None, genesis);
    info!(accepted = outcome.is_accepted(), "genesis block");

    let mut next = Block::new(2);
    let _ = next.add_transaction(Transaction::transfer(2, "bob", "alice", 50)?);
    let outcome = ledger.add_block(Some(1), next);
    info!(accepted = outcome.is_accepted(), "transfer block");

    println!("alice: {}", ledger.balance("alice")?);
    println!("bob: {}", ledger.balance("bob")?);
    Ok(())
}

fn print_report(report: &Report) {
    for outcome in &report.blocks {
        let parent = outcome
            .parent
            .map_or_else(|| "-".to_string(), |p| p.to_string());
        match &outcome.reason {
            None => println!("block {} (parent {parent}): accepted", outcome.block),
            Some(reason) => println!(
                "block {} (parent {parent}): rejected, {reason}",
                outcome.block
            ),
        }
        for dropped in &outcome.dropped {
            println!("  dropped: {dropped}");
        }
    }
    let chain: Vec<String> = report.longest_chain.iter().map(|id| id.to_string()).collect();
    println!("longest chain: {}", chain.join(" -> "));
    for (account, balance) in &report.balances {
        println!("{account}: {balance}");
    }
}
