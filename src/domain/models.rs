//! Ledger rows
//!
//! Plain row types as stored in PostgreSQL. Amounts are in minor currency
//! units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An account holding a balance in a single currency.
///
/// The balance only changes through deltas applied by the store; it is never
/// overwritten wholesale.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub owner: String,
    pub balance: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// A signed posting against one account: negative debits, positive credits.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// A movement of `amount` from one account to another, backed by two entries.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountParams {
    pub owner: String,
    pub balance: i64,
    pub currency: String,
}

impl CreateAccountParams {
    pub fn new(owner: impl Into<String>, balance: i64, currency: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            balance,
            currency: currency.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEntryParams {
    pub account_id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransferParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

/// Delta to add to an account balance in a single statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddAccountBalanceParams {
    pub id: i64,
    pub amount: i64,
}

/// Paging for entry listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntriesParams {
    pub account_id: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Paging for transfer listings between two accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTransfersParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub limit: i64,
    pub offset: i64,
}
