//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `user`: Users owning accounts
//! - `account`: Account aggregate and status
//! - `pocket`: Named sub-balances of an account
//! - `transaction`: Audit records and transfer requests
//! - `error`: Error types for the ledger and its store

pub mod account;
pub mod error;
pub mod pocket;
pub mod transaction;
pub mod user;

pub use account::{Account, AccountId, AccountStatus};
pub use error::{LedgerError, StoreError};
pub use pocket::{Pocket, PocketId};
pub use transaction::{
    Counterparty, Direction, NewTransaction, PocketTransfer, Transaction, TransactionId,
    TransferKind, TransferRecord,
};
pub use user::{NewUser, User, UserId};
