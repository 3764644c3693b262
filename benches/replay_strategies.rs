//! Benchmark suite for comparing replay strategies
//!
//! This benchmark compares the performance of the synchronous and asynchronous
//! replay strategies using the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! # Generated Fixtures
//!
//! Each run generates a ledger of 64 accounts with two pockets each, and a
//! transfers file of the requested size mixing pocket transfers, account
//! transfers and a share of rejected ones (unknown pockets, overdrafts).

use divan::Bencher;
use pocket_ledger::cli::StrategyType;
use pocket_ledger::strategy::{create_strategy, BatchConfig, ReplayInput};
use std::fmt::Write as _;
use std::fs;
use tempfile::TempDir;

const ACCOUNTS: usize = 64;

fn main() {
    divan::main();
}

/// Write the seed and transfer files into a fresh directory
fn generate_fixture(transfers: usize) -> (TempDir, ReplayInput) {
    let dir = TempDir::new().expect("Failed to create temp dir");

    let mut accounts = String::from("account,owner,balance,status\n");
    let mut pockets = String::from("account,name,balance,goal\n");
    for i in 0..ACCOUNTS {
        writeln!(accounts, "ACC-{:03},user{},100000.00,active", i, i % 16).unwrap();
        writeln!(pockets, "ACC-{:03},Viaje,0,5000", i).unwrap();
        writeln!(pockets, "ACC-{:03},Auto,0,", i).unwrap();
    }

    let mut records = String::from("type,source,target,amount\n");
    for n in 0..transfers {
        let source = n % ACCOUNTS;
        let written = match n % 10 {
            0..=3 => writeln!(records, "pocket,ACC-{:03},Viaje,{}.25", source, n % 50 + 1),
            4 => writeln!(records, "pocket,ACC-{:03},Inexistente,10", source),
            5 => writeln!(records, "account,ACC-{:03},ACC-{:03},999999", source, (source + 1) % ACCOUNTS),
            _ => writeln!(
                records,
                "account,ACC-{:03},ACC-{:03},{}.50",
                source,
                (source * 7 + n) % ACCOUNTS,
                n % 30 + 1
            ),
        };
        written.unwrap();
    }

    let input = ReplayInput {
        accounts: dir.path().join("accounts.csv"),
        pockets: Some(dir.path().join("pockets.csv")),
        transfers: dir.path().join("transfers.csv"),
    };
    fs::write(&input.accounts, accounts).expect("Failed to write accounts");
    fs::write(input.pockets.as_ref().unwrap(), pockets).expect("Failed to write pockets");
    fs::write(&input.transfers, records).expect("Failed to write transfers");

    (dir, input)
}

/// Synchronous replay, transfers applied in file order
#[divan::bench(args = [100, 1_000, 10_000])]
fn sync_strategy(bencher: Bencher, transfers: usize) {
    let (_dir, input) = generate_fixture(transfers);
    let strategy = create_strategy(StrategyType::Sync, None);

    bencher.bench_local(|| {
        let mut output = Vec::new();
        strategy
            .process(&input, &mut output)
            .expect("Replay failed");
    });
}

/// Asynchronous replay, batches partitioned by linked accounts
#[divan::bench(args = [100, 1_000, 10_000])]
fn async_strategy(bencher: Bencher, transfers: usize) {
    let (_dir, input) = generate_fixture(transfers);
    let strategy = create_strategy(StrategyType::Async, Some(BatchConfig::default()));

    bencher.bench_local(|| {
        let mut output = Vec::new();
        strategy
            .process(&input, &mut output)
            .expect("Replay failed");
    });
}
