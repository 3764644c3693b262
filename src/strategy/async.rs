//! Asynchronous batch replay strategy
//!
//! This module provides an asynchronous, multi-threaded implementation of the
//! ProcessingStrategy trait. It applies transfers in batches using thread-based
//! parallelism, partitioning each batch by linked accounts.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── seed_ledger (InMemoryStore + account number index)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (account partitioning + blocking tasks)
//!         └── TransferEngine (row-locked transfers)
//! ```
//!
//! # Thread-Based Parallelism
//!
//! - Processes batches sequentially so every account keeps file order across batches
//! - Splits each batch into partitions that share no account
//! - Runs partitions on the blocking pool of a tokio multi-threaded runtime
//! - Produces the same ledger as the synchronous strategy

use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_ledger_csv;
use crate::io::seed::seed_ledger;
use crate::strategy::{BatchProcessor, ProcessingStrategy, ReplayInput, ReplaySummary};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, warn};

/// Configuration for batch processing
///
/// Controls how transfers are batched and the number of worker threads
/// applying each batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of transfers per batch
    pub batch_size: usize,
    /// Number of runtime worker and blocking threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, replacing zero values with the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "invalid max_concurrent_batches, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch replay strategy
///
/// Transfers are read in batches and batches are applied one after another.
/// Within a batch, transfers are partitioned so that no two partitions share
/// an account, and the partitions are applied in parallel.
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    /// Create a new AsyncProcessingStrategy with the specified configuration
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Replay transfers from the input files and write the final ledger
    ///
    /// 1. Seeds an InMemoryStore from the account and pocket files
    /// 2. Creates a tokio multi-threaded runtime
    /// 3. Reads transfers in batches with AsyncReader
    /// 4. Applies each batch through the BatchProcessor and waits for it
    /// 5. Writes the ledger using csv_format::write_ledger_csv
    ///
    /// Fatal errors (file not found, I/O errors, runtime errors) are returned
    /// immediately. Rejected transfers and malformed rows are logged, counted in
    /// the returned summary, and processing continues.
    pub fn replay(
        &self,
        input: &ReplayInput,
        output: &mut dyn Write,
    ) -> Result<ReplaySummary, String> {
        let ledger = Arc::new(seed_ledger(&input.accounts, input.pockets.as_deref())?);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .max_blocking_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let summary = runtime.block_on(async {
            let processor = BatchProcessor::new(Arc::clone(&ledger));

            let file = tokio::fs::File::open(&input.transfers).await.map_err(|e| {
                format!(
                    "Failed to open file '{}': {}",
                    input.transfers.display(),
                    e
                )
            })?;

            // csv-async reads futures::io, tokio files need the compat layer
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader: AsyncReader<_> = AsyncReader::new(compat_file);

            let mut summary = ReplaySummary::default();
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                debug!(size = batch.len(), "applying batch");
                for processed in processor.process_batch(batch).await {
                    summary.record(&processed.result);
                }
            }
            summary.malformed = reader.skipped();
            summary.log();

            Ok::<ReplaySummary, String>(summary)
        })?;

        write_ledger_csv(&ledger.store.accounts(), output)?;
        Ok(summary)
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input: &ReplayInput, output: &mut dyn Write) -> Result<(), String> {
        self.replay(input, output).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_batch_config_zero_values_fall_back() {
        let config = BatchConfig::new(0, 0);

        assert_eq!(config, BatchConfig::default());
    }

    #[test]
    fn test_async_strategy_maintains_source_ordering_across_batches() {
        let accounts = create_temp_csv(
            "account,owner,balance,status\n\
             ACC-1,ana,100,active\n\
             ACC-2,luis,50,active\n\
             ACC-3,eva,0,active\n",
        );
        // ACC-1's third debit only fits after its first two, which land in
        // earlier batches
        let transfers = create_temp_csv(
            "type,source,target,amount\n\
             account,ACC-1,ACC-3,30\n\
             account,ACC-2,ACC-3,10\n\
             account,ACC-1,ACC-3,30\n\
             account,ACC-2,ACC-3,10\n\
             account,ACC-1,ACC-3,40\n\
             account,ACC-1,ACC-3,1\n",
        );
        let input = ReplayInput {
            accounts: accounts.path().to_path_buf(),
            pockets: None,
            transfers: transfers.path().to_path_buf(),
        };

        let strategy = AsyncProcessingStrategy::new(BatchConfig::new(2, num_cpus::get()));
        let mut output = Vec::new();
        strategy.process(&input, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account,pocket,balance,status\n\
             ACC-1,,0,active\n\
             ACC-2,,30,active\n\
             ACC-3,,120,active\n"
        );
    }

    #[test]
    fn test_async_strategy_counts_malformed_rows() {
        let accounts = create_temp_csv(
            "account,owner,balance,status
             ACC-1,ana,100,active
             ACC-2,luis,0,active
",
        );
        let transfers = create_temp_csv(
            "type,source,target,amount
             account,ACC-1,ACC-2,invalid
             account,ACC-1,ACC-2,10
             refund,ACC-1,ACC-2,10
             account,ACC-2,ACC-1,50
             account,ACC-1,ACC-9,5
",
        );
        let input = ReplayInput {
            accounts: accounts.path().to_path_buf(),
            pockets: None,
            transfers: transfers.path().to_path_buf(),
        };

        let strategy = AsyncProcessingStrategy::new(BatchConfig::new(2, 2));
        let summary = strategy.replay(&input, &mut Vec::new()).unwrap();

        assert_eq!(
            summary,
            ReplaySummary {
                applied: 1,
                rejected: 2,
                malformed: 2,
            }
        );
    }

    #[test]
    fn test_async_strategy_handles_missing_file() {
        let accounts = create_temp_csv("account,owner,balance,status\nACC-1,ana,1,active\n");
        let input = ReplayInput {
            accounts: accounts.path().to_path_buf(),
            pockets: None,
            transfers: PathBuf::from("nonexistent.csv"),
        };

        let strategy = AsyncProcessingStrategy::new(BatchConfig::default());
        let mut output = Vec::new();

        let result = strategy.process(&input, &mut output);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Failed to open file"));
    }
}
