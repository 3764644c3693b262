//! Transfer engine
//!
//! This module provides the TransferEngine that validates and executes transfers
//! by running each one as a single unit of work on the [`Store`].
//!
//! The engine enforces business rules such as:
//! - Account status checks (only active accounts move money)
//! - Positive amounts and sufficient funds on the debited account
//! - Conservation: every debit is matched by an equal credit
//! - An audit transaction for every leg of a committed transfer
//!
//! Validation happens inside the unit of work, after the account rows are
//! locked, so the balances checked are the balances written.

use crate::core::ledger::{fetch_account, fetch_pocket};
use crate::core::traits::Store;
use crate::types::{
    Account, AccountId, Counterparty, Direction, LedgerError, NewTransaction, PocketTransfer,
    Transaction,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Transfer engine
///
/// Holds no state of its own beyond a shared handle to the store, so it can be
/// cloned freely and used from many threads at once.
#[derive(Debug)]
pub struct TransferEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for TransferEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: Store> TransferEngine<S> {
    /// Create a TransferEngine over a shared store
    pub fn new(store: Arc<S>) -> Self {
        TransferEngine { store }
    }

    /// The store this engine writes to
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Move funds from an account into one of its pockets
    ///
    /// # Arguments
    ///
    /// * `account_id` - The account to debit
    /// * `pocket_name` - Exact, case-sensitive name of the pocket to credit
    /// * `amount` - The amount to move
    ///
    /// # Returns
    ///
    /// The new balances of the account and of the pocket.
    ///
    /// # Errors
    ///
    /// Checked in this order, first failure wins and nothing is written:
    /// - `NotFound("account")` if the account does not exist
    /// - `InvalidState` if the account is blocked
    /// - `NotFound("pocket")` if the account has no pocket with that name
    /// - `InvalidArgument` if the amount is not strictly positive
    /// - `InsufficientFunds` if the account balance is below the amount
    /// - `TransferFailed` if the store could not commit
    pub fn transfer_to_pocket(
        &self,
        account_id: AccountId,
        pocket_name: &str,
        amount: Decimal,
    ) -> Result<PocketTransfer, LedgerError> {
        let result = self.store.atomically(&[account_id], |unit| {
            let mut account = fetch_account(unit, account_id, "account")?;
            if !account.is_active() {
                return Err(LedgerError::invalid_state("account not active"));
            }

            let mut pocket = fetch_pocket(unit, &account, pocket_name)?;
            ensure_positive(amount)?;
            ensure_covers(&account, amount)?;

            account.balance = debit(&account, amount)?;
            pocket.balance = pocket
                .balance
                .checked_add(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("pocket credit", account_id))?;

            unit.save_account(&account)?;
            unit.save_pocket(&pocket)?;
            unit.append_transaction(NewTransaction {
                account: account.id,
                amount,
                timestamp: Utc::now(),
                direction: Direction::Out,
                counterparty: Counterparty::Pocket(pocket.id),
            })?;

            Ok(PocketTransfer {
                account_balance: account.balance,
                pocket_balance: pocket.balance,
                remaining_to_goal: pocket.remaining_to_goal(),
            })
        });

        match &result {
            Ok(transfer) => info!(
                account = account_id,
                pocket = pocket_name,
                %amount,
                account_balance = %transfer.account_balance,
                pocket_balance = %transfer.pocket_balance,
                remaining_to_goal = ?transfer.remaining_to_goal,
                "transfer to pocket committed"
            ),
            Err(e) => warn!(
                account = account_id,
                pocket = pocket_name,
                %amount,
                error = %e,
                "transfer to pocket rejected"
            ),
        }
        result
    }

    /// Move funds from one account to another
    ///
    /// # Arguments
    ///
    /// * `source_id` - The account to debit
    /// * `dest_id` - The account to credit
    /// * `amount` - The amount to move
    ///
    /// # Returns
    ///
    /// The new balance of the source account. The destination balance is not
    /// revealed to the caller.
    ///
    /// # Errors
    ///
    /// Checked in this order, first failure wins and nothing is written:
    /// - `NotFound("source account")` / `NotFound("destination account")`
    /// - `InvalidArgument` if source and destination are the same account
    /// - `InvalidState` if the source, then the destination, is blocked
    /// - `InvalidArgument` if the amount is not strictly positive
    /// - `InsufficientFunds` if the source balance is below the amount
    /// - `TransferFailed` if the store could not commit
    pub fn transfer_to_account(
        &self,
        source_id: AccountId,
        dest_id: AccountId,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        // The store locks the pair in ascending id order whatever order they are passed in
        let result = self.store.atomically(&[source_id, dest_id], |unit| {
            let mut source = fetch_account(unit, source_id, "source account")?;
            let mut destination = fetch_account(unit, dest_id, "destination account")?;

            if source_id == dest_id {
                return Err(LedgerError::invalid_argument(
                    "source and destination must differ",
                ));
            }
            if !source.is_active() {
                return Err(LedgerError::invalid_state("source not active"));
            }
            if !destination.is_active() {
                return Err(LedgerError::invalid_state("destination not active"));
            }
            ensure_positive(amount)?;
            ensure_covers(&source, amount)?;

            source.balance = debit(&source, amount)?;
            destination.balance = destination
                .balance
                .checked_add(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("credit", dest_id))?;

            unit.save_account(&source)?;
            unit.save_account(&destination)?;

            let timestamp = Utc::now();
            unit.append_transaction(NewTransaction {
                account: source_id,
                amount,
                timestamp,
                direction: Direction::Out,
                counterparty: Counterparty::Account(dest_id),
            })?;
            unit.append_transaction(NewTransaction {
                account: dest_id,
                amount,
                timestamp,
                direction: Direction::In,
                counterparty: Counterparty::Account(source_id),
            })?;

            Ok(source.balance)
        });

        match &result {
            Ok(balance) => info!(
                source = source_id,
                destination = dest_id,
                %amount,
                source_balance = %balance,
                "transfer to account committed"
            ),
            Err(e) => warn!(
                source = source_id,
                destination = dest_id,
                %amount,
                error = %e,
                "transfer to account rejected"
            ),
        }
        result
    }

    /// Committed snapshot of an account with its pockets
    pub fn account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store
            .find_account(id)
            .ok_or_else(|| LedgerError::not_found("account"))
    }

    /// Audit transactions of an account, in the order they were committed
    pub fn history(&self, id: AccountId) -> Result<Vec<Transaction>, LedgerError> {
        self.account(id)?;
        Ok(self.store.transactions(id))
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_argument("amount must be positive"));
    }
    Ok(())
}

fn ensure_covers(account: &Account, amount: Decimal) -> Result<(), LedgerError> {
    if account.balance < amount {
        return Err(LedgerError::insufficient_funds(
            account.id,
            account.balance,
            amount,
        ));
    }
    Ok(())
}

fn debit(account: &Account, amount: Decimal) -> Result<Decimal, LedgerError> {
    account
        .balance
        .checked_sub(amount)
        .ok_or_else(|| LedgerError::arithmetic_overflow("debit", account.id))
}
