//! Replay strategy module
//!
//! This module defines the Strategy pattern for complete replay pipelines:
//! seeding the ledger, applying a file of transfer requests through the
//! [`TransferEngine`] and writing the final ledger. Different implementations
//! (synchronous, asynchronous batch) can be selected at runtime.

use crate::cli::StrategyType;
use crate::core::{InMemoryStore, TransferEngine};
use crate::io::SeededLedger;
use crate::types::{AccountId, LedgerError, TransferKind, TransferRecord};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

pub mod r#async;
pub mod batch_processor;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use batch_processor::BatchProcessor;
pub use sync::SyncProcessingStrategy;

/// Input files of one replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayInput {
    /// `accounts.csv`: account, owner, balance, status
    pub accounts: PathBuf,

    /// Optional `pockets.csv`: account, name, balance, goal
    pub pockets: Option<PathBuf>,

    /// `transfers.csv`: type, source, target, amount
    pub transfers: PathBuf,
}

/// Why a transfer record was not applied
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplayError {
    /// The record names an account number that was never seeded
    #[error("Unknown account number '{number}'")]
    UnknownAccount { number: String },

    /// The engine refused the transfer
    #[error(transparent)]
    Rejected(#[from] LedgerError),
}

/// Counters reported at the end of a replay
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
    pub malformed: usize,
}

impl ReplaySummary {
    /// Count the outcome of one transfer record
    pub fn record(&mut self, result: &Result<(), ReplayError>) {
        match result {
            Ok(()) => self.applied += 1,
            Err(_) => self.rejected += 1,
        }
    }

    fn log(&self) {
        info!(
            applied = self.applied,
            rejected = self.rejected,
            malformed = self.malformed,
            "replay finished"
        );
    }
}

/// Processing strategy trait for complete replay pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the transfers of `input` and write the final ledger to `output`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An input file cannot be opened (file not found, permission denied)
    /// - A runtime needed by the strategy cannot be started
    /// - Output cannot be written
    ///
    /// Malformed rows and rejected transfers are logged and do not cause this
    /// method to return an error. Processing continues with the next record.
    fn process(&self, input: &ReplayInput, output: &mut dyn Write) -> Result<(), String>;
}

/// Apply one transfer record through the engine
///
/// Account numbers are resolved against the seeded ledger. An unknown number
/// is logged here; engine rejections are logged by the engine itself.
pub fn apply_transfer(
    engine: &TransferEngine<InMemoryStore>,
    ledger: &SeededLedger,
    record: &TransferRecord,
) -> Result<(), ReplayError> {
    let source = resolve(ledger, &record.source)?;

    match record.kind {
        TransferKind::Pocket => {
            engine.transfer_to_pocket(source, &record.target, record.amount)?;
        }
        TransferKind::Account => {
            let target = resolve(ledger, &record.target)?;
            engine.transfer_to_account(source, target, record.amount)?;
        }
    }
    Ok(())
}

fn resolve(ledger: &SeededLedger, number: &str) -> Result<AccountId, ReplayError> {
    ledger.resolve(number).ok_or_else(|| {
        warn!(account = number, "skipping transfer with unknown account number");
        ReplayError::UnknownAccount {
            number: number.to_string(),
        }
    })
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config))
        }
    }
}
