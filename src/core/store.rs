//! In-memory ledger store
//!
//! This module provides the `InMemoryStore`, the reference implementation of the
//! [`Store`] contract, plus the seeding operations needed to build a ledger.
//!
//! # Design
//!
//! Every account aggregate (account row, its pockets and its transaction
//! history) lives in its own `Arc<Mutex<_>>` row inside a `DashMap`. A unit of
//! work locks only the rows in its scope, in ascending id order, and stages
//! writes in a private buffer. Commit applies the buffer to the locked rows
//! in one infallible pass; dropping the unit without committing discards it.
//!
//! # Thread Safety
//!
//! - Units touching disjoint accounts run in parallel
//! - Units touching the same account serialize on its row lock
//! - Two units locking the same pair of accounts always acquire them in the
//!   same order, so opposite-direction transfers cannot deadlock
//!
//! Readers outside a unit of work block on the row lock and therefore only
//! ever observe committed state.

use crate::core::traits::{Store, UnitOfWork};
use crate::types::{
    Account, AccountId, AccountStatus, NewTransaction, NewUser, Pocket, PocketId, StoreError,
    Transaction, TransactionId, User, UserId,
};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// One account aggregate as stored
#[derive(Debug)]
struct AccountRow {
    /// Account row with its pockets in creation order
    account: Account,

    /// Audit records in append order
    transactions: Vec<Transaction>,

    /// Set under the row lock when the owning user is deleted, so a unit that
    /// obtained the handle before removal sees the account as gone
    deleted: bool,
}

type RowHandle = Arc<Mutex<AccountRow>>;

/// Thread-safe in-memory ledger store
///
/// Identifiers for users, accounts, pockets and transactions come from
/// independent counters starting at 1. Transaction ids taken by a unit that is
/// later rolled back are not reused.
#[derive(Debug)]
pub struct InMemoryStore {
    users: DashMap<UserId, User>,
    accounts: DashMap<AccountId, RowHandle>,
    next_user: AtomicU64,
    next_account: AtomicU64,
    next_pocket: AtomicU64,
    next_transaction: AtomicU64,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            accounts: DashMap::new(),
            next_user: AtomicU64::new(1),
            next_account: AtomicU64::new(1),
            next_pocket: AtomicU64::new(1),
            next_transaction: AtomicU64::new(1),
        }
    }

    /// Clone the row handle so no map shard stays locked while waiting on a row
    fn row(&self, id: AccountId) -> Option<RowHandle> {
        self.accounts.get(&id).map(|row| Arc::clone(row.value()))
    }

    fn lock_row(id: AccountId, handle: &RowHandle) -> Result<MutexGuard<'_, AccountRow>, StoreError> {
        handle
            .lock()
            .map_err(|_| StoreError::LockPoisoned { account: id })
    }

    /// Create a user owning no accounts
    pub fn create_user(&self, user: NewUser) -> UserId {
        let id = self.next_user.fetch_add(1, Ordering::Relaxed);
        self.users.insert(
            id,
            User {
                id,
                name: user.name,
                email: user.email,
                login: user.login,
                national_id: user.national_id,
                accounts: Vec::new(),
            },
        );
        id
    }

    /// Snapshot of a user
    pub fn user(&self, id: UserId) -> Option<User> {
        self.users.get(&id).map(|user| user.value().clone())
    }

    /// Open an account for an existing user
    ///
    /// # Errors
    ///
    /// Returns `UnknownUser` if `owner` does not exist.
    pub fn open_account(
        &self,
        owner: UserId,
        number: &str,
        balance: Decimal,
        status: AccountStatus,
    ) -> Result<AccountId, StoreError> {
        // Holding the user entry keeps a concurrent delete_user from missing this account
        let mut user = self
            .users
            .get_mut(&owner)
            .ok_or(StoreError::UnknownUser { user: owner })?;

        let id = self.next_account.fetch_add(1, Ordering::Relaxed);
        let account = Account {
            id,
            owner,
            number: number.to_string(),
            balance,
            status,
            pockets: Vec::new(),
        };
        self.accounts.insert(
            id,
            Arc::new(Mutex::new(AccountRow {
                account,
                transactions: Vec::new(),
                deleted: false,
            })),
        );
        user.accounts.push(id);

        debug!(account = id, owner, number, "account opened");
        Ok(id)
    }

    /// Create an empty pocket in an account
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - `UnknownAccount` if the account does not exist
    /// - `AccountNotActive` if the account is blocked
    /// - `DuplicatePocket` if the account already has a pocket with this exact name
    pub fn create_pocket(
        &self,
        account: AccountId,
        name: &str,
        savings_goal: Option<Decimal>,
    ) -> Result<PocketId, StoreError> {
        let handle = self
            .row(account)
            .ok_or(StoreError::UnknownAccount { account })?;
        let mut row = Self::lock_row(account, &handle)?;

        if row.deleted {
            return Err(StoreError::UnknownAccount { account });
        }
        if !row.account.is_active() {
            return Err(StoreError::AccountNotActive { account });
        }
        if row.account.pocket(name).is_some() {
            return Err(StoreError::DuplicatePocket {
                account,
                name: name.to_string(),
            });
        }

        let id = self.next_pocket.fetch_add(1, Ordering::Relaxed);
        row.account.pockets.push(Pocket {
            id,
            account,
            name: name.to_string(),
            balance: Decimal::ZERO,
            savings_goal,
        });

        debug!(account, pocket = id, name, "pocket created");
        Ok(id)
    }

    /// Block or unblock an account
    pub fn set_status(&self, account: AccountId, status: AccountStatus) -> Result<(), StoreError> {
        self.atomically(&[account], |unit| {
            let mut snapshot = unit
                .find_account(account)
                .ok_or(StoreError::UnknownAccount { account })?;
            snapshot.status = status;
            unit.save_account(&snapshot)
        })
    }

    /// Delete a user together with its accounts, their pockets and history
    ///
    /// Returns the ids of the deleted accounts.
    pub fn delete_user(&self, user: UserId) -> Result<Vec<AccountId>, StoreError> {
        let (_, removed) = self
            .users
            .remove(&user)
            .ok_or(StoreError::UnknownUser { user })?;

        let mut accounts = removed.accounts;
        accounts.sort_unstable();
        for id in &accounts {
            if let Some((_, handle)) = self.accounts.remove(id) {
                // The row is going away, a poisoned lock does not matter here
                let mut row = handle.lock().unwrap_or_else(PoisonError::into_inner);
                row.deleted = true;
            }
        }

        debug!(user, accounts = accounts.len(), "user deleted");
        Ok(accounts)
    }

    /// Committed snapshots of all accounts, sorted by id
    pub fn accounts(&self) -> Vec<Account> {
        let handles: Vec<RowHandle> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut accounts: Vec<Account> = handles
            .iter()
            .filter_map(|handle| {
                let row = handle.lock().unwrap_or_else(PoisonError::into_inner);
                if row.deleted {
                    None
                } else {
                    Some(row.account.clone())
                }
            })
            .collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for InMemoryStore {
    fn atomically<T, E, F>(&self, scope: &[AccountId], work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut ids = scope.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let handles: Vec<(AccountId, RowHandle)> = ids
            .iter()
            .filter_map(|&id| self.row(id).map(|handle| (id, handle)))
            .collect();

        debug!(scope = ?ids, "locking account rows");
        let mut rows = Vec::with_capacity(handles.len());
        for (id, handle) in &handles {
            rows.push((*id, Self::lock_row(*id, handle)?));
        }

        let mut unit = InMemoryUnitOfWork {
            next_transaction: &self.next_transaction,
            rows,
            accounts: HashMap::new(),
            pockets: Vec::new(),
            transactions: Vec::new(),
        };

        // An Err here drops the unit and with it every staged write
        let output = work(&mut unit)?;
        unit.commit();
        Ok(output)
    }

    fn find_account(&self, id: AccountId) -> Option<Account> {
        let handle = self.row(id)?;
        let row = handle.lock().unwrap_or_else(PoisonError::into_inner);
        if row.deleted {
            None
        } else {
            Some(row.account.clone())
        }
    }

    fn transactions(&self, account: AccountId) -> Vec<Transaction> {
        self.row(account)
            .map(|handle| {
                let row = handle.lock().unwrap_or_else(PoisonError::into_inner);
                if row.deleted {
                    Vec::new()
                } else {
                    row.transactions.clone()
                }
            })
            .unwrap_or_default()
    }
}

/// Unit of work over locked account rows
struct InMemoryUnitOfWork<'a> {
    next_transaction: &'a AtomicU64,

    /// Locked rows in ascending id order
    rows: Vec<(AccountId, MutexGuard<'a, AccountRow>)>,

    /// Staged account rows, last save wins
    accounts: HashMap<AccountId, Account>,

    /// Staged pockets in save order
    pockets: Vec<Pocket>,

    /// Staged audit records in append order
    transactions: Vec<Transaction>,
}

impl InMemoryUnitOfWork<'_> {
    fn row(&self, id: AccountId) -> Option<&AccountRow> {
        self.rows
            .iter()
            .find(|(row_id, _)| *row_id == id)
            .map(|(_, row)| &**row)
            .filter(|row| !row.deleted)
    }

    fn writable(&self, id: AccountId) -> Result<&AccountRow, StoreError> {
        match self.rows.iter().find(|(row_id, _)| *row_id == id) {
            None => Err(StoreError::OutOfScope { account: id }),
            Some((_, row)) if row.deleted => Err(StoreError::UnknownAccount { account: id }),
            Some((_, row)) => Ok(&**row),
        }
    }

    /// Apply every staged write to the locked rows
    fn commit(self) {
        let InMemoryUnitOfWork {
            mut rows,
            accounts,
            pockets,
            transactions,
            ..
        } = self;

        for (id, row) in rows.iter_mut() {
            overlay(&mut row.account, accounts.get(id), &pockets);
            row.transactions.extend(
                transactions
                    .iter()
                    .filter(|transaction| transaction.account == *id)
                    .cloned(),
            );
        }

        debug!(
            accounts = accounts.len(),
            pockets = pockets.len(),
            transactions = transactions.len(),
            "unit of work committed"
        );
    }
}

/// Apply a staged account row and staged pockets on top of a snapshot
fn overlay(account: &mut Account, staged: Option<&Account>, pockets: &[Pocket]) {
    if let Some(staged) = staged {
        account.number = staged.number.clone();
        account.balance = staged.balance;
        account.status = staged.status;
    }
    for pocket in pockets.iter().filter(|pocket| pocket.account == account.id) {
        if let Some(slot) = account.pockets.iter_mut().find(|slot| slot.id == pocket.id) {
            *slot = pocket.clone();
        }
    }
}

impl UnitOfWork for InMemoryUnitOfWork<'_> {
    fn find_account(&self, id: AccountId) -> Option<Account> {
        let mut account = self.row(id)?.account.clone();
        overlay(&mut account, self.accounts.get(&id), &self.pockets);
        Some(account)
    }

    fn find_pocket(&self, account: AccountId, name: &str) -> Option<Pocket> {
        self.find_account(account)?.pocket(name).cloned()
    }

    fn save_account(&mut self, account: &Account) -> Result<(), StoreError> {
        self.writable(account.id)?;
        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    fn save_pocket(&mut self, pocket: &Pocket) -> Result<(), StoreError> {
        self.writable(pocket.account)?;
        let current = self
            .find_account(pocket.account)
            .ok_or(StoreError::UnknownAccount {
                account: pocket.account,
            })?;

        if !current.pockets.iter().any(|existing| existing.id == pocket.id) {
            return Err(StoreError::UnknownPocket {
                account: pocket.account,
                pocket: pocket.id,
            });
        }
        if current
            .pockets
            .iter()
            .any(|existing| existing.id != pocket.id && existing.name == pocket.name)
        {
            return Err(StoreError::DuplicatePocket {
                account: pocket.account,
                name: pocket.name.clone(),
            });
        }

        self.pockets.push(pocket.clone());
        Ok(())
    }

    fn append_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<TransactionId, StoreError> {
        self.writable(transaction.account)?;
        let id = self.next_transaction.fetch_add(1, Ordering::Relaxed);
        self.transactions.push(transaction.into_transaction(id));
        Ok(id)
    }
}
