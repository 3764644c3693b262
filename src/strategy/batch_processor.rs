//! Batch processing with account partitioning
//!
//! This module provides the `BatchProcessor` struct, which applies a batch of
//! transfer records concurrently while keeping the records of every account in
//! file order.
//!
//! # Design
//!
//! A batch is split into partitions of records that share an account, either
//! as source or as account-transfer target. Account numbers linked by any
//! record of the batch end up in the same partition, so no two partitions touch
//! the same account. Each partition applies its records sequentially and
//! partitions run in parallel; the final ledger is the one the synchronous
//! strategy produces.
//!
//! Row locks are `std::sync::Mutex`es, so partitions run on tokio's blocking
//! pool rather than on the async workers.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── TransferEngine<InMemoryStore>  (shared transfer engine)
//!     └── Arc<SeededLedger>              (account number index)
//! ```

use crate::core::{InMemoryStore, TransferEngine};
use crate::io::SeededLedger;
use crate::strategy::{apply_transfer, ReplayError};
use crate::types::{TransferKind, TransferRecord};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

/// Result of applying a single transfer record
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Position of the record in its batch
    pub index: usize,

    /// The outcome of applying it
    pub result: Result<(), ReplayError>,
}

/// Disjoint sets over the account numbers of one batch
#[derive(Debug, Default)]
struct AccountGroups {
    slots: HashMap<String, usize>,
    parent: Vec<usize>,
}

impl AccountGroups {
    fn slot(&mut self, number: &str) -> usize {
        if let Some(&slot) = self.slots.get(number) {
            return slot;
        }
        let slot = self.parent.len();
        self.parent.push(slot);
        self.slots.insert(number.to_string(), slot);
        slot
    }

    fn root(&mut self, mut slot: usize) -> usize {
        while self.parent[slot] != slot {
            self.parent[slot] = self.parent[self.parent[slot]];
            slot = self.parent[slot];
        }
        slot
    }

    fn join(&mut self, a: usize, b: usize) {
        let (a, b) = (self.root(a), self.root(b));
        if a != b {
            self.parent[a.max(b)] = a.min(b);
        }
    }
}

/// Batch processor with account partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    engine: TransferEngine<InMemoryStore>,
    ledger: Arc<SeededLedger>,
}

impl BatchProcessor {
    /// Create a new BatchProcessor over a seeded ledger
    pub fn new(ledger: Arc<SeededLedger>) -> Self {
        let engine = TransferEngine::new(Arc::clone(&ledger.store));
        Self { engine, ledger }
    }

    /// Partition a batch of transfers into groups that share no account
    ///
    /// Records are tagged with their position in the batch.
    ///
    /// # Guarantees
    ///
    /// - Each record appears in exactly one partition
    /// - Two records touching the same account land in the same partition
    /// - Records keep their original order inside a partition
    /// - Partitions are ordered by their first record
    pub fn partition_by_accounts(
        &self,
        batch: Vec<TransferRecord>,
    ) -> Vec<Vec<(usize, TransferRecord)>> {
        let mut groups = AccountGroups::default();
        let slots: Vec<usize> = batch
            .iter()
            .map(|record| {
                let source = groups.slot(&record.source);
                // A pocket target is a name inside the source account
                if record.kind == TransferKind::Account {
                    let target = groups.slot(&record.target);
                    groups.join(source, target);
                }
                source
            })
            .collect();

        let mut partitions: Vec<Vec<(usize, TransferRecord)>> = Vec::new();
        let mut by_root: HashMap<usize, usize> = HashMap::new();
        for (index, (record, slot)) in batch.into_iter().zip(slots).enumerate() {
            let root = groups.root(slot);
            let partition = *by_root.entry(root).or_insert_with(|| {
                partitions.push(Vec::new());
                partitions.len() - 1
            });
            partitions[partition].push((index, record));
        }

        partitions
    }

    /// Apply the transfers of one partition sequentially
    ///
    /// All records are applied even if some fail. Results are returned in
    /// input order.
    pub fn process_partition(
        &self,
        transfers: Vec<(usize, TransferRecord)>,
    ) -> Vec<ProcessingResult> {
        transfers
            .into_iter()
            .map(|(index, record)| ProcessingResult {
                index,
                result: apply_transfer(&self.engine, &self.ledger, &record),
            })
            .collect()
    }

    /// Apply a batch of transfers with account-based partitioning
    ///
    /// Spawns one blocking task per partition and waits for all of them.
    /// Results are returned in batch order.
    pub async fn process_batch(&self, batch: Vec<TransferRecord>) -> Vec<ProcessingResult> {
        let partitions = self.partition_by_accounts(batch);

        let mut tasks = Vec::with_capacity(partitions.len());
        for transfers in partitions {
            let processor = self.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                processor.process_partition(transfers)
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(partition_results) => results.extend(partition_results),
                Err(e) => error!(error = %e, "transfer task panicked"),
            }
        }

        results.sort_by_key(|processed| processed.index);
        results
    }
}
