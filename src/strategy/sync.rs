//! Synchronous replay strategy
//!
//! This module provides a synchronous, single-threaded implementation of the
//! ProcessingStrategy trait. It orchestrates a replay by coordinating between
//! the seeding step, the SyncReader (for CSV input) and the TransferEngine (for
//! business logic).
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - Ledger construction to `seed::seed_ledger`
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Transfer validation and execution to `TransferEngine`
//! - CSV output to `csv_format::write_ledger_csv`
//!
//! Transfers are applied strictly in file order, so the final ledger is the one
//! a sequential reading of the file describes.

use crate::core::TransferEngine;
use crate::io::csv_format::write_ledger_csv;
use crate::io::seed::seed_ledger;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{apply_transfer, ProcessingStrategy, ReplayInput, ReplaySummary};
use crate::types::TransferRecord;
use std::io::Write;
use std::sync::Arc;
use tracing::warn;

/// Synchronous replay strategy
///
/// # Examples
///
/// ```no_run
/// use pocket_ledger::strategy::{ProcessingStrategy, ReplayInput, SyncProcessingStrategy};
/// use std::io;
///
/// let input = ReplayInput {
///     accounts: "accounts.csv".into(),
///     pockets: None,
///     transfers: "transfers.csv".into(),
/// };
/// let strategy = SyncProcessingStrategy;
/// let mut output = io::stdout();
///
/// strategy.process(&input, &mut output).expect("Replay failed");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

impl SyncProcessingStrategy {
    /// Replay transfers from the input files and write the final ledger
    ///
    /// 1. Seeds an InMemoryStore from the account and pocket files
    /// 2. Streams transfer records with a SyncReader
    /// 3. Applies each record through the TransferEngine
    /// 4. Writes the ledger using csv_format::write_ledger_csv
    ///
    /// Fatal errors (file not found, I/O errors) are returned immediately.
    /// Rejected transfers and malformed rows are logged, counted in the
    /// returned summary, and processing continues.
    pub fn replay(
        &self,
        input: &ReplayInput,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, String> {
        let ledger = seed_ledger(&input.accounts, input.pockets.as_deref())?;
        let engine = TransferEngine::new(Arc::clone(&ledger.store));

        let reader = SyncReader::<TransferRecord>::new(&input.transfers)?;

        let mut summary = ReplaySummary::default();
        for result in reader {
            match result {
                Ok(record) => summary.record(&apply_transfer(&engine, &ledger, &record)),
                Err(e) => {
                    warn!(error = %e, "CSV parsing error");
                    summary.malformed += 1;
                }
            }
        }
        summary.log();

        write_ledger_csv(&ledger.store.accounts(), output)?;
        Ok(summary)
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input: &ReplayInput, output: &mut dyn Write) -> Result<(), String> {
        self.replay(input, output).map(|_| ())
    }
}
