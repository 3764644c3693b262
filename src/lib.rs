//! Pocket Ledger Library
//! # Overview
//!
//! This library provides the transfer engine of a small banking ledger: users
//! own accounts, accounts hold a balance and a set of named pockets, and money
//! moves either from an account into one of its pockets or from one account to
//! another. A replay driver seeds a ledger from CSV and applies a CSV of
//! transfers with a sync or an async strategy.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (User, Account, Pocket, Transaction, errors)
//! - [`core`] - Business logic components:
//!   - [`core::traits`] - Storage contract with scoped atomic units of work
//!   - [`core::store`] - In-memory store with per-account row locks
//!   - [`core::ledger`] - Typed account and pocket lookups
//!   - [`core::engine`] - Transfer validation and execution
//! - [`io`] - CSV readers, ledger seeding and output
//! - [`strategy`] - Sync and async replay pipelines
//! - [`cli`] - CLI arguments parsing and logging setup
//!
//! # Transfers
//!
//! - **Account to pocket**: debit an active account, credit one of its pockets
//!   found by exact name
//! - **Account to account**: debit an active source, credit a different
//!   active destination
//!
//! Every transfer runs inside one unit of work: all its writes and audit
//! records commit together or not at all, and concurrent transfers touching
//! the same account are serialized.

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{InMemoryStore, Store, TransferEngine, UnitOfWork};
pub use io::write_ledger_csv;
pub use types::{
    Account, AccountId, AccountStatus, LedgerError, Pocket, PocketId, PocketTransfer,
    StoreError, Transaction, TransactionId, User, UserId,
};
