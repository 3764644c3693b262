//! Ledger seeding from CSV
//!
//! Builds the starting state of a replay: users, accounts and funded pockets,
//! loaded into an [`InMemoryStore`]. Accounts are referenced by number in the
//! input files; [`SeededLedger::resolve`] maps numbers to store identifiers.
//!
//! Seeding is forgiving in the same way transfer replay is: a bad row is
//! logged and skipped, only an unreadable file is fatal.

use crate::core::store::InMemoryStore;
use crate::core::traits::Store;
use crate::io::sync_reader::SyncReader;
use crate::types::{AccountId, AccountStatus, NewUser, PocketId, StoreError, UserId};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Opening state of one account
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSeed {
    pub number: String,

    /// Login of the owning user; one user is created per distinct login
    pub owner: String,

    pub balance: Decimal,
    pub status: AccountStatus,
}

/// Opening state of one pocket
#[derive(Debug, Clone, PartialEq)]
pub struct PocketSeed {
    /// Number of the owning account
    pub account: String,
    pub name: String,
    pub balance: Decimal,
    pub goal: Option<Decimal>,
}

/// A seeded store together with its account-number index
#[derive(Debug, Clone)]
pub struct SeededLedger {
    pub store: Arc<InMemoryStore>,
    accounts: HashMap<String, AccountId>,
}

impl SeededLedger {
    /// Store identifier of the account with this number
    pub fn resolve(&self, number: &str) -> Option<AccountId> {
        self.accounts.get(number).copied()
    }

    /// Number of accounts that were seeded
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

/// Read the seed files and build the ledger
///
/// # Arguments
///
/// * `accounts_path` - Path to `accounts.csv`
/// * `pockets_path` - Optional path to `pockets.csv`
///
/// # Errors
///
/// Returns an error message if either file cannot be opened. Invalid rows are
/// logged and skipped.
pub fn seed_ledger(accounts_path: &Path, pockets_path: Option<&Path>) -> Result<SeededLedger, String> {
    let accounts = valid_rows(SyncReader::<AccountSeed>::new(accounts_path)?);
    let pockets = match pockets_path {
        Some(path) => valid_rows(SyncReader::<PocketSeed>::new(path)?),
        None => Vec::new(),
    };

    Ok(build_ledger(accounts, pockets))
}

fn valid_rows<T>(rows: impl Iterator<Item = Result<T, String>>) -> Vec<T> {
    rows.filter_map(|row| match row {
        Ok(seed) => Some(seed),
        Err(e) => {
            warn!(error = %e, "skipping invalid seed row");
            None
        }
    })
    .collect()
}

/// Build a ledger from already parsed seeds
///
/// Accounts are opened active so their pockets can be created, and blocked
/// afterwards when their seed says so. Duplicate account numbers, pockets of
/// unknown accounts and duplicate pocket names are logged and skipped.
pub fn build_ledger(
    accounts: impl IntoIterator<Item = AccountSeed>,
    pockets: impl IntoIterator<Item = PocketSeed>,
) -> SeededLedger {
    let store = Arc::new(InMemoryStore::new());
    let mut owners: HashMap<String, UserId> = HashMap::new();
    let mut numbers: HashMap<String, AccountId> = HashMap::new();
    let mut blocked = Vec::new();

    for seed in accounts {
        if numbers.contains_key(&seed.number) {
            warn!(account = %seed.number, "skipping duplicate account number");
            continue;
        }

        let owner = *owners
            .entry(seed.owner.clone())
            .or_insert_with(|| store.create_user(NewUser::with_login(&seed.owner)));

        match store.open_account(owner, &seed.number, seed.balance, AccountStatus::Active) {
            Ok(id) => {
                if seed.status == AccountStatus::Blocked {
                    blocked.push(id);
                }
                numbers.insert(seed.number, id);
            }
            Err(e) => warn!(account = %seed.number, error = %e, "failed to open account"),
        }
    }

    for seed in pockets {
        let Some(&account) = numbers.get(&seed.account) else {
            warn!(account = %seed.account, pocket = %seed.name, "skipping pocket of unknown account");
            continue;
        };

        let created = store
            .create_pocket(account, &seed.name, seed.goal)
            .and_then(|pocket| {
                if seed.balance > Decimal::ZERO {
                    fund_pocket(&store, account, pocket, &seed.name, seed.balance)?;
                }
                Ok(pocket)
            });
        if let Err(e) = created {
            warn!(account = %seed.account, pocket = %seed.name, error = %e, "failed to create pocket");
        }
    }

    for id in blocked {
        if let Err(e) = store.set_status(id, AccountStatus::Blocked) {
            warn!(account = id, error = %e, "failed to block account");
        }
    }

    info!(
        users = owners.len(),
        accounts = numbers.len(),
        "ledger seeded"
    );

    SeededLedger {
        store,
        accounts: numbers,
    }
}

/// Set the opening balance of a freshly created pocket
fn fund_pocket(
    store: &InMemoryStore,
    account: AccountId,
    pocket: PocketId,
    name: &str,
    balance: Decimal,
) -> Result<(), StoreError> {
    store.atomically(&[account], |unit| {
        let mut row = unit
            .find_pocket(account, name)
            .ok_or(StoreError::UnknownPocket { account, pocket })?;
        row.balance = balance;
        unit.save_pocket(&row)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn account(number: &str, owner: &str, balance: i64, status: AccountStatus) -> AccountSeed {
        AccountSeed {
            number: number.to_string(),
            owner: owner.to_string(),
            balance: Decimal::new(balance, 0),
            status,
        }
    }

    fn pocket(account: &str, name: &str, balance: i64) -> PocketSeed {
        PocketSeed {
            account: account.to_string(),
            name: name.to_string(),
            balance: Decimal::new(balance, 0),
            goal: None,
        }
    }

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_build_ledger_creates_one_user_per_owner() {
        let ledger = build_ledger(
            vec![
                account("ACC-1", "ana", 100, AccountStatus::Active),
                account("ACC-2", "ana", 200, AccountStatus::Active),
                account("ACC-3", "luis", 300, AccountStatus::Active),
            ],
            vec![],
        );

        let first = ledger.store.find_account(ledger.resolve("ACC-1").unwrap()).unwrap();
        let second = ledger.store.find_account(ledger.resolve("ACC-2").unwrap()).unwrap();
        let third = ledger.store.find_account(ledger.resolve("ACC-3").unwrap()).unwrap();
        assert_eq!(first.owner, second.owner);
        assert_ne!(first.owner, third.owner);
        assert_eq!(ledger.store.user(first.owner).unwrap().accounts.len(), 2);
        assert_eq!(ledger.store.user(third.owner).unwrap().login, "luis");
    }

    #[test]
    fn test_build_ledger_skips_duplicate_numbers() {
        let ledger = build_ledger(
            vec![
                account("ACC-1", "ana", 100, AccountStatus::Active),
                account("ACC-1", "luis", 999, AccountStatus::Active),
            ],
            vec![],
        );

        assert_eq!(ledger.account_count(), 1);
        let kept = ledger.store.find_account(ledger.resolve("ACC-1").unwrap()).unwrap();
        assert_eq!(kept.balance, Decimal::new(100, 0));
    }

    #[test]
    fn test_build_ledger_funds_pockets_of_blocked_accounts() {
        let ledger = build_ledger(
            vec![account("ACC-1", "ana", 100, AccountStatus::Blocked)],
            vec![pocket("ACC-1", "Viaje", 40)],
        );

        let seeded = ledger.store.find_account(ledger.resolve("ACC-1").unwrap()).unwrap();
        assert_eq!(seeded.status, AccountStatus::Blocked);
        assert_eq!(seeded.balance, Decimal::new(100, 0));
        assert_eq!(seeded.pocket("Viaje").unwrap().balance, Decimal::new(40, 0));
    }

    #[test]
    fn test_build_ledger_skips_bad_pockets() {
        let ledger = build_ledger(
            vec![account("ACC-1", "ana", 100, AccountStatus::Active)],
            vec![
                pocket("ACC-1", "Viaje", 10),
                pocket("ACC-1", "Viaje", 20),
                pocket("ACC-9", "Auto", 30),
            ],
        );

        let seeded = ledger.store.find_account(ledger.resolve("ACC-1").unwrap()).unwrap();
        assert_eq!(seeded.pockets.len(), 1);
        assert_eq!(seeded.pockets[0].balance, Decimal::new(10, 0));
        assert_eq!(ledger.resolve("ACC-9"), None);
    }

    #[test]
    fn test_seeding_appends_no_transactions() {
        let ledger = build_ledger(
            vec![account("ACC-1", "ana", 100, AccountStatus::Active)],
            vec![pocket("ACC-1", "Viaje", 10)],
        );

        let id = ledger.resolve("ACC-1").unwrap();
        assert!(ledger.store.transactions(id).is_empty());
    }

    #[test]
    fn test_seed_ledger_from_files() {
        let accounts = create_temp_csv(
            "account,owner,balance,status\n\
             ACC-1,ana,1000,active\n\
             ACC-2,luis,-5,active\n\
             ACC-3,luis,50.25,BLOCKED\n",
        );
        let pockets = create_temp_csv("account,name,balance,goal\nACC-1,Viaje,25,500\n");

        let ledger = seed_ledger(accounts.path(), Some(pockets.path())).unwrap();

        // The negative opening balance row is skipped
        assert_eq!(ledger.account_count(), 2);
        assert_eq!(ledger.resolve("ACC-2"), None);
        let blocked = ledger.store.find_account(ledger.resolve("ACC-3").unwrap()).unwrap();
        assert_eq!(blocked.balance, Decimal::new(5025, 2));
        assert_eq!(blocked.status, AccountStatus::Blocked);
        let viaje = ledger
            .store
            .find_account(ledger.resolve("ACC-1").unwrap())
            .unwrap()
            .pocket("Viaje")
            .cloned()
            .unwrap();
        assert_eq!(viaje.balance, Decimal::new(25, 0));
        assert_eq!(viaje.savings_goal, Some(Decimal::new(500, 0)));
    }

    #[test]
    fn test_seed_ledger_missing_file() {
        let result = seed_ledger(Path::new("nonexistent.csv"), None);

        assert!(result.unwrap_err().contains("Failed to open file"));
    }
}
