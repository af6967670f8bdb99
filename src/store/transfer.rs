//! Transfer workflow
//!
//! Records a transfer, its two entries and both balance updates in one
//! transaction. Balances are always updated lowest account id first, so two
//! transfers over the same pair of accounts take their row locks in the same
//! order whatever their direction, and can never wait on each other in a
//! cycle.

use futures::FutureExt;

use crate::domain::{
    AddAccountBalanceParams, CreateEntryParams, CreateTransferParams, TransferTxParams,
    TransferTxResult,
};

use super::{Store, StoreError, TransferStep};

/// Which side of the transfer a balance update belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    From,
    To,
}

/// One balance delta of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub leg: Leg,
    pub account_id: i64,
    pub delta: i64,
}

impl BalanceUpdate {
    fn step(&self) -> TransferStep {
        match self.leg {
            Leg::From => TransferStep::AddFromBalance,
            Leg::To => TransferStep::AddToBalance,
        }
    }

    fn params(&self) -> AddAccountBalanceParams {
        AddAccountBalanceParams {
            id: self.account_id,
            amount: self.delta,
        }
    }
}

/// Balance updates of a transfer in the order they must be applied.
///
/// Sorted by account id; the sort is stable so ties keep the debit first.
pub fn balance_updates(params: &TransferTxParams) -> [BalanceUpdate; 2] {
    let mut updates = [
        BalanceUpdate {
            leg: Leg::From,
            account_id: params.from_account_id,
            delta: -params.amount,
        },
        BalanceUpdate {
            leg: Leg::To,
            account_id: params.to_account_id,
            delta: params.amount,
        },
    ];
    updates.sort_by_key(|update| update.account_id);
    updates
}

/// Map results produced in application order back onto the request's roles.
///
/// Returns `(from, to)`.
fn by_leg<T>(order: &[BalanceUpdate; 2], first: T, second: T) -> (T, T) {
    match order[0].leg {
        Leg::From => (first, second),
        Leg::To => (second, first),
    }
}

impl Store {
    /// Move `params.amount` from one account to the other.
    ///
    /// Creates the transfer, the debit entry and the credit entry, then
    /// applies both balance deltas in ascending account id order. Any failure
    /// rolls the whole transaction back and is reported with the step that
    /// failed. Validation is left to the database constraints.
    pub async fn transfer_tx(&self, params: TransferTxParams) -> Result<TransferTxResult, StoreError> {
        let result = self
            .exec_tx(move |mut q| {
                async move {
                    let transfer = q
                        .create_transfer(CreateTransferParams {
                            from_account_id: params.from_account_id,
                            to_account_id: params.to_account_id,
                            amount: params.amount,
                        })
                        .await
                        .map_err(StoreError::step(TransferStep::CreateTransfer))?;

                    let from_entry = q
                        .create_entry(CreateEntryParams {
                            account_id: params.from_account_id,
                            amount: -params.amount,
                        })
                        .await
                        .map_err(StoreError::step(TransferStep::CreateFromEntry))?;

                    let to_entry = q
                        .create_entry(CreateEntryParams {
                            account_id: params.to_account_id,
                            amount: params.amount,
                        })
                        .await
                        .map_err(StoreError::step(TransferStep::CreateToEntry))?;

                    let order = balance_updates(&params);
                    let [first, second] = order;

                    let first_account = q
                        .add_account_balance(first.params())
                        .await
                        .map_err(StoreError::step(first.step()))?;

                    let second_account = q
                        .add_account_balance(second.params())
                        .await
                        .map_err(StoreError::step(second.step()))?;

                    let (from_account, to_account) = by_leg(&order, first_account, second_account);

                    Ok::<_, StoreError>(TransferTxResult {
                        transfer,
                        from_account,
                        to_account,
                        from_entry,
                        to_entry,
                    })
                }
                .boxed()
            })
            .await?;

        tracing::debug!(
            "Transfer {} applied: {} -> {} ({})",
            result.transfer.id,
            params.from_account_id,
            params.to_account_id,
            params.amount
        );

        Ok(result)
    }
}
