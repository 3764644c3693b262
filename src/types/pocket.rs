//! Pocket type: a named sub-balance earmarked inside one account

use super::account::AccountId;
use rust_decimal::Decimal;

/// Pocket identifier, assigned by the store at creation
pub type PocketId = u64;

/// Pocket snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Pocket {
    /// Store-assigned identifier
    pub id: PocketId,

    /// Back-reference to the owning account
    pub account: AccountId,

    /// Name, unique within the owning account (case-sensitive)
    pub name: String,

    /// Current balance, never negative
    pub balance: Decimal,

    /// Optional savings target
    pub savings_goal: Option<Decimal>,
}

impl Pocket {
    /// Remaining amount to reach the savings goal, if one is set
    ///
    /// Returns zero once the goal has been met or exceeded.
    pub fn remaining_to_goal(&self) -> Option<Decimal> {
        self.savings_goal
            .map(|goal| (goal - self.balance).max(Decimal::ZERO))
    }
}
