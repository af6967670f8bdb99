//! Data-access handle
//!
//! Parameterized ledger queries over a single PostgreSQL connection.

use sqlx::PgConnection;

use crate::domain::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListEntriesParams, ListTransfersParams, Transfer,
};

/// Ledger queries bound to one connection.
///
/// The connection may be a pooled connection or an open transaction (both
/// deref to `PgConnection`); the queries behave the same either way.
pub struct Queries<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> Queries<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    pub async fn create_account(
        &mut self,
        params: &CreateAccountParams,
    ) -> Result<Account, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (owner, balance, currency)
            VALUES ($1, $2, $3)
            RETURNING id, owner, balance, currency, created_at
            "#,
        )
        .bind(&params.owner)
        .bind(params.balance)
        .bind(&params.currency)
        .fetch_one(&mut *self.conn)
        .await
    }

    pub async fn get_account(&mut self, id: i64) -> Result<Account, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, owner, balance, currency, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *self.conn)
        .await
    }

    /// Add a delta to an account balance and return the updated row.
    ///
    /// Read-modify-write happens in one statement, so concurrent deltas on
    /// the same row serialize on its row lock instead of losing updates.
    pub async fn add_account_balance(
        &mut self,
        params: AddAccountBalanceParams,
    ) -> Result<Account, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET balance = balance + $2
            WHERE id = $1
            RETURNING id, owner, balance, currency, created_at
            "#,
        )
        .bind(params.id)
        .bind(params.amount)
        .fetch_one(&mut *self.conn)
        .await
    }

    // =========================================================================
    // Entries
    // =========================================================================

    pub async fn create_entry(&mut self, params: CreateEntryParams) -> Result<Entry, sqlx::Error> {
        sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO entries (account_id, amount)
            VALUES ($1, $2)
            RETURNING id, account_id, amount, created_at
            "#,
        )
        .bind(params.account_id)
        .bind(params.amount)
        .fetch_one(&mut *self.conn)
        .await
    }

    pub async fn get_entry(&mut self, id: i64) -> Result<Entry, sqlx::Error> {
        sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, account_id, amount, created_at
            FROM entries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *self.conn)
        .await
    }

    pub async fn list_entries(
        &mut self,
        params: ListEntriesParams,
    ) -> Result<Vec<Entry>, sqlx::Error> {
        sqlx::query_as::<_, Entry>(
            r#"
            SELECT id, account_id, amount, created_at
            FROM entries
            WHERE account_id = $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(params.account_id)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&mut *self.conn)
        .await
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    pub async fn create_transfer(
        &mut self,
        params: CreateTransferParams,
    ) -> Result<Transfer, sqlx::Error> {
        sqlx::query_as::<_, Transfer>(
            r#"
            INSERT INTO transfers (from_account_id, to_account_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id, from_account_id, to_account_id, amount, created_at
            "#,
        )
        .bind(params.from_account_id)
        .bind(params.to_account_id)
        .bind(params.amount)
        .fetch_one(&mut *self.conn)
        .await
    }

    pub async fn get_transfer(&mut self, id: i64) -> Result<Transfer, sqlx::Error> {
        sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, from_account_id, to_account_id, amount, created_at
            FROM transfers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *self.conn)
        .await
    }

    /// Transfers sent by `from_account_id` or received by `to_account_id`
    pub async fn list_transfers(
        &mut self,
        params: ListTransfersParams,
    ) -> Result<Vec<Transfer>, sqlx::Error> {
        sqlx::query_as::<_, Transfer>(
            r#"
            SELECT id, from_account_id, to_account_id, amount, created_at
            FROM transfers
            WHERE from_account_id = $1 OR to_account_id = $2
            ORDER BY id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(params.from_account_id)
        .bind(params.to_account_id)
        .bind(params.limit)
        .bind(params.offset)
        .fetch_all(&mut *self.conn)
        .await
    }
}
