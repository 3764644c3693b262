//! Pocket Ledger CLI
//!
//! Command-line interface for replaying transfers against a seeded ledger.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- accounts.csv transfers.csv > ledger.csv
//! cargo run -- --pockets pockets.csv accounts.csv transfers.csv > ledger.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 accounts.csv transfers.csv > ledger.csv
//! ```
//!
//! The program seeds the ledger from the accounts (and optional pockets) file,
//! applies every transfer record through the transfer engine using the
//! selected strategy, and writes the final ledger to stdout. Logs go to stderr
//! and are filtered with `RUST_LOG`.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use pocket_ledger::cli;
use pocket_ledger::strategy;
use std::process;
use tracing::error;

fn main() {
    let args = cli::parse_args();
    cli::init_logging();

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), config)
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.to_replay_input(), &mut output) {
        error!(error = %e, "replay failed");
        process::exit(1);
    }
}
