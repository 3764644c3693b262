//! Error types for the pocket ledger
//!
//! This module defines the errors raised by the transfer engine and by the
//! storage layer underneath it.
//!
//! # Error Categories
//!
//! - **Validation Errors**: Missing account or pocket, blocked account, bad amount,
//!   insufficient funds. Raised in a fixed order before anything is written.
//! - **Storage Errors**: The atomic commit could not complete. Surface to callers
//!   as [`LedgerError::TransferFailed`]; nothing is left half-applied.
//! - **Arithmetic Errors**: Overflow while crediting a balance

use super::account::AccountId;
use super::pocket::PocketId;
use super::user::UserId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for transfers
///
/// None of these are retried by the engine. `TransferFailed` is transient:
/// callers may retry the whole operation, which re-runs validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// A referenced account or pocket does not exist
    #[error("{entity} not found")]
    NotFound {
        /// What was looked up ("account", "pocket", "source account", ...)
        entity: String,
    },

    /// An account involved in the transfer is blocked
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    /// Non-positive amount, or a transfer from an account to itself
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The debited account holds less than the requested amount
    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: Decimal,
        requested: Decimal,
    },

    /// The atomic commit failed at the storage layer
    ///
    /// The unit of work was rolled back.
    #[error("Transfer failed: {reason}")]
    TransferFailed { reason: String },

    /// Crediting a balance would exceed the decimal range
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        operation: String,
        account: AccountId,
    },
}

/// Storage-layer failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The backing store could not be reached or refused the commit
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    /// A thread panicked while holding the row lock of this account
    #[error("Row lock for account {account} is poisoned")]
    LockPoisoned { account: AccountId },

    /// A write targeted an account that is not locked by the unit of work
    #[error("Account {account} is outside the unit of work scope")]
    OutOfScope { account: AccountId },

    #[error("Account {account} does not exist")]
    UnknownAccount { account: AccountId },

    #[error("Pocket {pocket} does not exist in account {account}")]
    UnknownPocket { account: AccountId, pocket: PocketId },

    #[error("User {user} does not exist")]
    UnknownUser { user: UserId },

    /// Pocket names are unique within an account
    #[error("Account {account} already has a pocket named '{name}'")]
    DuplicatePocket { account: AccountId, name: String },

    #[error("Account {account} is not active")]
    AccountNotActive { account: AccountId },
}

// Any storage failure during a transfer surfaces as TransferFailed
impl From<StoreError> for LedgerError {
    fn from(error: StoreError) -> Self {
        LedgerError::TransferFailed {
            reason: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a NotFound error
    pub fn not_found(entity: &str) -> Self {
        LedgerError::NotFound {
            entity: entity.to_string(),
        }
    }

    /// Create an InvalidState error
    pub fn invalid_state(reason: &str) -> Self {
        LedgerError::InvalidState {
            reason: reason.to_string(),
        }
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(reason: &str) -> Self {
        LedgerError::InvalidArgument {
            reason: reason.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, balance: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account,
            balance,
            requested,
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Whether retrying the whole operation from scratch may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::TransferFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    #[case::not_found(
        LedgerError::NotFound { entity: "pocket".to_string() },
        "pocket not found"
    )]
    #[case::invalid_state(
        LedgerError::InvalidState { reason: "account not active".to_string() },
        "Invalid state: account not active"
    )]
    #[case::invalid_argument(
        LedgerError::InvalidArgument { reason: "amount must be positive".to_string() },
        "Invalid argument: amount must be positive"
    )]
    #[case::insufficient_funds(
        LedgerError::InsufficientFunds { account: 7, balance: Decimal::new(100000, 2), requested: Decimal::new(200000, 2) },
        "Insufficient funds in account 7: balance 1000.00, requested 2000.00"
    )]
    #[case::transfer_failed(
        LedgerError::TransferFailed { reason: "Store unavailable: disk full".to_string() },
        "Transfer failed: Store unavailable: disk full"
    )]
    #[case::arithmetic_overflow(
        LedgerError::ArithmeticOverflow { operation: "credit".to_string(), account: 3 },
        "Arithmetic overflow in credit for account 3"
    )]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::not_found(
        LedgerError::not_found("source account"),
        LedgerError::NotFound { entity: "source account".to_string() }
    )]
    #[case::invalid_state(
        LedgerError::invalid_state("destination not active"),
        LedgerError::InvalidState { reason: "destination not active".to_string() }
    )]
    #[case::invalid_argument(
        LedgerError::invalid_argument("source and destination must differ"),
        LedgerError::InvalidArgument { reason: "source and destination must differ".to_string() }
    )]
    #[case::insufficient_funds(
        LedgerError::insufficient_funds(1, Decimal::ONE, Decimal::TWO),
        LedgerError::InsufficientFunds { account: 1, balance: Decimal::ONE, requested: Decimal::TWO }
    )]
    fn test_helper_functions(#[case] result: LedgerError, #[case] expected: LedgerError) {
        assert_eq!(result, expected);
    }

    #[test]
    fn test_store_error_conversion() {
        let error: LedgerError = StoreError::LockPoisoned { account: 9 }.into();
        assert!(matches!(error, LedgerError::TransferFailed { .. }));
        assert_eq!(
            error.to_string(),
            "Transfer failed: Row lock for account 9 is poisoned"
        );
        assert!(error.is_transient());
    }

    #[test]
    fn test_validation_errors_are_not_transient() {
        assert!(!LedgerError::not_found("account").is_transient());
        assert!(!LedgerError::invalid_argument("amount must be positive").is_transient());
    }
}
