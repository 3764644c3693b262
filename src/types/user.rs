//! User types
//!
//! Users only own accounts; nothing in the transfer path reads them.

use super::account::AccountId;

/// User identifier, assigned by the store at creation
pub type UserId = u64;

/// Stored user with the accounts it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub login: String,
    /// National identity document number
    pub national_id: String,
    /// Owned accounts; deleting the user deletes them
    pub accounts: Vec<AccountId>,
}

/// Fields supplied when creating a user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub login: String,
    pub national_id: String,
}

impl NewUser {
    /// A user known only by login, as created by the replay seeder
    pub fn with_login(login: &str) -> Self {
        NewUser {
            name: login.to_string(),
            login: login.to_string(),
            ..NewUser::default()
        }
    }
}
