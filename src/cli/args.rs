use crate::strategy::{BatchConfig, ReplayInput};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay account and pocket transfers against a seeded ledger
#[derive(Parser, Debug)]
#[command(name = "pocket-ledger")]
#[command(about = "Replay account and pocket transfers against a seeded ledger", long_about = None)]
pub struct CliArgs {
    /// Accounts CSV file path (account,owner,balance,status)
    #[arg(value_name = "ACCOUNTS", help = "Path to the accounts CSV file")]
    pub accounts_file: PathBuf,

    /// Transfers CSV file path (type,source,target,amount)
    #[arg(value_name = "TRANSFERS", help = "Path to the transfers CSV file")]
    pub transfers_file: PathBuf,

    /// Pockets CSV file path (account,name,balance,goal)
    #[arg(
        long = "pockets",
        value_name = "POCKETS",
        help = "Path to a CSV file of pockets to create before replaying"
    )]
    pub pockets_file: Option<PathBuf>,

    /// Replay strategy to use for processing transfers
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Replay strategy: 'sync' for file order or 'async' for parallel batches"
    )]
    pub strategy: StrategyType,

    /// Number of transfers per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of transfers per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads applying a batch (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,
}

/// Available replay strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Input files of the replay
    pub fn to_replay_input(&self) -> ReplayInput {
        ReplayInput {
            accounts: self.accounts_file.clone(),
            pockets: self.pockets_file.clone(),
            transfers: self.transfers_file.clone(),
        }
    }

    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values fall back to the defaults; zero values are replaced by
    /// the defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }
}
