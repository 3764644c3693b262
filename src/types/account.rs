//! Account-related types for the pocket ledger
//!
//! This module defines the Account aggregate (an account together with its
//! pockets) and the status gate that decides whether money may move through it.

use super::pocket::Pocket;
use super::user::UserId;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Account identifier, assigned by the store at creation
pub type AccountId = u64;

/// Whether an account may take part in transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountStatus {
    /// The account may be debited and credited
    Active,

    /// The account is frozen; every transfer touching it is rejected
    Blocked,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(AccountStatus::Active),
            "blocked" => Ok(AccountStatus::Blocked),
            other => Err(format!("Invalid account status: '{}'", other)),
        }
    }
}

/// Account snapshot
///
/// A consistent in-memory copy of an account row and the pockets it owns,
/// as read through the store. Mutating a snapshot has no effect until it is
/// saved inside a unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Store-assigned identifier
    pub id: AccountId,

    /// The user owning this account
    pub owner: UserId,

    /// Human-facing account number
    pub number: String,

    /// Current balance
    ///
    /// Never negative at rest; transfers refuse to overdraw it.
    pub balance: Decimal,

    /// Status gate for transfers
    pub status: AccountStatus,

    /// Pockets in creation order
    pub pockets: Vec<Pocket>,
}

impl Account {
    /// Whether the account may be debited or credited
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Find a pocket by exact, case-sensitive name
    ///
    /// Scans pockets in creation order and returns the first match.
    pub fn pocket(&self, name: &str) -> Option<&Pocket> {
        self.pockets.iter().find(|pocket| pocket.name == name)
    }
}
