//! CSV format handling for ledger seeds, transfer records and ledger output
//!
//! This module centralizes all CSV format concerns, providing:
//! - Raw record structures for deserialization of the three input files
//! - Conversion from raw records to domain types via [`CsvRow`]
//! - Ledger output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::io::seed::{AccountSeed, PocketSeed};
use crate::types::{Account, AccountStatus, TransferKind, TransferRecord};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// A domain record that can be read from one CSV row
///
/// Readers deserialize each row into `Raw` and then call [`CsvRow::from_raw`],
/// so format validation lives next to the format and not in the readers.
pub trait CsvRow: Sized {
    /// Row layout as it appears in the file
    type Raw: DeserializeOwned + 'static;

    /// Validate and convert a raw row
    fn from_raw(raw: Self::Raw) -> Result<Self, String>;
}

/// Row of `transfers.csv`: type, source, target, amount
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TransferCsvRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub target: String,
    pub amount: Option<String>,
}

/// Row of `accounts.csv`: account, owner, balance, status
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AccountCsvRecord {
    pub account: String,
    pub owner: String,
    pub balance: String,
    pub status: Option<String>,
}

/// Row of `pockets.csv`: account, name, balance, goal
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PocketCsvRecord {
    pub account: String,
    pub name: String,
    pub balance: Option<String>,
    pub goal: Option<String>,
}

/// Parse an optional decimal column, treating blank as absent
fn parse_optional_decimal(value: Option<&str>, context: &str) -> Result<Option<Decimal>, String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Decimal::from_str(text)
            .map(Some)
            .map_err(|_| format!("Invalid amount '{}' for {}", text, context)),
        _ => Ok(None),
    }
}

fn require(value: &str, what: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("Missing {}", what));
    }
    Ok(value.to_string())
}

impl CsvRow for TransferRecord {
    type Raw = TransferCsvRecord;

    /// Convert a transfer row
    ///
    /// The type is matched case-insensitively and the amount must be present.
    /// The sign and size of the amount are left for the engine to judge, so a
    /// negative amount still reaches it and is rejected there.
    fn from_raw(raw: TransferCsvRecord) -> Result<Self, String> {
        let kind = match raw.kind.trim().to_lowercase().as_str() {
            "pocket" => TransferKind::Pocket,
            "account" => TransferKind::Account,
            _ => {
                return Err(format!(
                    "Invalid transfer type: '{}' for source {}",
                    raw.kind, raw.source
                ))
            }
        };

        let source = require(&raw.source, "source account")?;
        let target = require(&raw.target, "transfer target")?;

        let context = format!("transfer from {}", source);
        let amount = parse_optional_decimal(raw.amount.as_deref(), &context)?
            .ok_or_else(|| format!("{:?} transfer from {} requires an amount", kind, source))?;

        Ok(TransferRecord {
            kind,
            source,
            target,
            amount,
        })
    }
}

impl CsvRow for AccountSeed {
    type Raw = AccountCsvRecord;

    /// Convert an account row; a blank status means active
    fn from_raw(raw: AccountCsvRecord) -> Result<Self, String> {
        let number = require(&raw.account, "account number")?;
        let owner = require(&raw.owner, "owner")?;

        let context = format!("account {}", number);
        let balance = parse_optional_decimal(Some(&raw.balance), &context)?
            .ok_or_else(|| format!("Account {} requires an opening balance", number))?;
        if balance < Decimal::ZERO {
            return Err(format!(
                "Negative opening balance '{}' for account {}",
                balance, number
            ));
        }

        let status = match raw.status.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => AccountStatus::from_str(text)?,
            _ => AccountStatus::Active,
        };

        Ok(AccountSeed {
            number,
            owner,
            balance,
            status,
        })
    }
}

impl CsvRow for PocketSeed {
    type Raw = PocketCsvRecord;

    /// Convert a pocket row; a blank balance means an empty pocket
    fn from_raw(raw: PocketCsvRecord) -> Result<Self, String> {
        let account = require(&raw.account, "account number")?;
        // Pocket names are matched exactly later on, so only the csv trim applies
        if raw.name.is_empty() {
            return Err(format!("Missing pocket name for account {}", account));
        }

        let context = format!("pocket '{}' of account {}", raw.name, account);
        let balance =
            parse_optional_decimal(raw.balance.as_deref(), &context)?.unwrap_or(Decimal::ZERO);
        if balance < Decimal::ZERO {
            return Err(format!("Negative balance '{}' for {}", balance, context));
        }
        let goal = parse_optional_decimal(raw.goal.as_deref(), &context)?;

        Ok(PocketSeed {
            account,
            name: raw.name,
            balance,
            goal,
        })
    }
}

/// Write the ledger state in CSV format
///
/// Writes one row per account (`account,,balance,status`) followed by one row
/// per pocket of that account (`account,pocket,balance,`). Accounts are sorted
/// by number and pockets keep their creation order, so the output is
/// deterministic whatever order the transfers were applied in.
///
/// # Arguments
///
/// * `accounts` - Account snapshots including their pockets
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_ledger_csv(accounts: &[Account], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "pocket", "balance", "status"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts: Vec<&Account> = accounts.iter().collect();
    sorted_accounts.sort_by(|a, b| a.number.cmp(&b.number));

    for account in sorted_accounts {
        let balance = account.balance.to_string();
        writer
            .write_record([
                account.number.as_str(),
                "",
                balance.as_str(),
                account.status.as_str(),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;

        for pocket in &account.pockets {
            let pocket_balance = pocket.balance.to_string();
            writer
                .write_record([
                    account.number.as_str(),
                    pocket.name.as_str(),
                    pocket_balance.as_str(),
                    "",
                ])
                .map_err(|e| format!("Failed to write pocket record: {}", e))?;
        }
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
