//! I/O module
//!
//! Handles CSV parsing, ledger seeding and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (row conversion, output serialization)
//! - `sync_reader` - Synchronous CSV reader with iterator interface
//! - `async_reader` - Asynchronous CSV reader with batch reading interface
//! - `seed` - Builds the starting ledger from the account and pocket files

pub mod async_reader;
pub mod csv_format;
pub mod seed;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{write_ledger_csv, CsvRow};
pub use seed::{seed_ledger, AccountSeed, PocketSeed, SeededLedger};
pub use sync_reader::SyncReader;
