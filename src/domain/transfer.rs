//! Transfer input and output

use serde::{Deserialize, Serialize};

use super::models::{Account, Entry, Transfer};

/// Request to move `amount` from one account to another.
///
/// Callers are expected to pass `amount > 0` and distinct accounts; the
/// database constraints reject anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTxParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

impl TransferTxParams {
    pub fn new(from_account_id: i64, to_account_id: i64, amount: i64) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
        }
    }
}

/// Everything a committed transfer wrote.
///
/// `from_account` and `to_account` always follow the request's roles, not the
/// order the balances were updated in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTxResult {
    pub transfer: Transfer,
    pub from_account: Account,
    pub to_account: Account,
    pub from_entry: Entry,
    pub to_entry: Entry,
}
