//! Ledger read path
//!
//! Resolves the accounts and pockets a transfer needs from inside its unit of
//! work, turning missing rows into typed `NotFound` errors. Because the unit
//! holds the account row locks, the snapshots returned here stay consistent
//! until the unit commits.

use crate::core::traits::UnitOfWork;
use crate::types::{Account, AccountId, LedgerError, Pocket};

/// Resolve an account, reporting a miss as `NotFound(role)`
///
/// `role` names the account in the error ("account", "source account",
/// "destination account").
pub fn fetch_account(
    unit: &dyn UnitOfWork,
    id: AccountId,
    role: &str,
) -> Result<Account, LedgerError> {
    unit.find_account(id)
        .ok_or_else(|| LedgerError::not_found(role))
}

/// Resolve a pocket of `account` by exact name, reporting a miss as `NotFound("pocket")`
pub fn fetch_pocket(
    unit: &dyn UnitOfWork,
    account: &Account,
    name: &str,
) -> Result<Pocket, LedgerError> {
    unit.find_pocket(account.id, name)
        .ok_or_else(|| LedgerError::not_found("pocket"))
}
