//! Transaction-related types for the pocket ledger
//!
//! This module defines the audit records appended for every transfer leg, the
//! transfer requests replayed from CSV, and the outcome of a pocket transfer.

use super::account::AccountId;
use super::pocket::PocketId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Transaction identifier, assigned by the store when the row is appended
pub type TransactionId = u64;

/// Direction of a transfer leg relative to the account it is recorded on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Money entered the account
    In,

    /// Money left the account
    Out,
}

/// The other side of a transfer leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counterparty {
    Account(AccountId),
    Pocket(PocketId),
}

/// Audit record of one completed transfer leg
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Store-assigned identifier
    pub id: TransactionId,

    /// The account this leg is recorded on
    pub account: AccountId,

    /// Amount moved, always positive
    pub amount: Decimal,

    /// When the transfer was executed
    pub timestamp: DateTime<Utc>,

    pub direction: Direction,

    pub counterparty: Counterparty,
}

/// Audit record before the store has assigned it an identifier
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub account: AccountId,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub counterparty: Counterparty,
}

impl NewTransaction {
    /// Attach a store-assigned identifier
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            account: self.account,
            amount: self.amount,
            timestamp: self.timestamp,
            direction: self.direction,
            counterparty: self.counterparty,
        }
    }
}

/// New balances after a transfer into a pocket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PocketTransfer {
    pub account_balance: Decimal,
    pub pocket_balance: Decimal,

    /// Shortfall to the pocket's savings goal, `None` when it has no goal
    pub remaining_to_goal: Option<Decimal>,
}

/// Kinds of transfer the replay driver understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// From an account into one of its pockets
    Pocket,

    /// From one account to another
    Account,
}

/// Transfer request as read from the input CSV
///
/// Accounts are referenced by account number; `target` is a pocket name for
/// pocket transfers and an account number for account transfers.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    pub kind: TransferKind,

    /// Number of the account being debited
    pub source: String,

    pub target: String,

    /// Requested amount; validated by the engine, not the reader
    pub amount: Decimal,
}
