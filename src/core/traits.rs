//! Core traits for ledger storage
//!
//! This module defines the storage contract the transfer engine consumes. Any
//! backend (the bundled [`InMemoryStore`](crate::core::InMemoryStore), or a
//! database adapter) can drive the engine by implementing [`Store`].

use crate::types::{
    Account, AccountId, NewTransaction, Pocket, StoreError, Transaction, TransactionId,
};

/// Reads and staged writes inside one atomic unit of work
///
/// Only the accounts named in the unit's scope are visible. Writes are staged
/// and become visible to other readers only when the unit commits; if the unit
/// is abandoned they are discarded.
pub trait UnitOfWork {
    /// Snapshot of an in-scope account, including its pockets and any writes
    /// already staged in this unit
    fn find_account(&self, id: AccountId) -> Option<Account>;

    /// First pocket of `account` whose name equals `name` exactly
    fn find_pocket(&self, account: AccountId, name: &str) -> Option<Pocket>;

    /// Stage the account row (number, balance, status)
    ///
    /// The `pockets` field is ignored; pockets are saved with [`save_pocket`].
    ///
    /// [`save_pocket`]: UnitOfWork::save_pocket
    fn save_account(&mut self, account: &Account) -> Result<(), StoreError>;

    /// Stage the pocket row (name, balance, savings goal)
    fn save_pocket(&mut self, pocket: &Pocket) -> Result<(), StoreError>;

    /// Stage an audit record and return the identifier it will be stored under
    fn append_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<TransactionId, StoreError>;
}

/// Persistence collaborator of the transfer engine
///
/// Implementations must make [`atomically`](Store::atomically) behave like a
/// database transaction with row-level locks on the scoped accounts: no other
/// unit touching those accounts may interleave, and either every staged write
/// is applied or none is.
pub trait Store: Send + Sync {
    /// Run `work` as one atomic unit scoped to `scope`
    ///
    /// The scope is locked in ascending identifier order, so callers may pass
    /// ids in any order (duplicates are ignored). Accounts in the scope that do
    /// not exist are simply absent from the unit.
    ///
    /// If `work` returns `Err`, every staged write is rolled back and the error
    /// is returned unchanged. Storage failures are converted into `E`.
    fn atomically<T, E, F>(&self, scope: &[AccountId], work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
        E: From<StoreError>;

    /// Committed snapshot of an account, outside any unit of work
    ///
    /// Must not be called from inside `work` for an account in that unit's
    /// scope.
    fn find_account(&self, id: AccountId) -> Option<Account>;

    /// Committed audit records of an account, in append order
    fn transactions(&self, account: AccountId) -> Vec<Transaction>;
}
