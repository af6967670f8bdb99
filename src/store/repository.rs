//! Store Repository
//!
//! Owns the connection pool and runs units of work inside transactions.

use futures::future::BoxFuture;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};

use crate::domain::{
    Account, CreateAccountParams, Entry, ListEntriesParams, ListTransfersParams, Transfer,
};

use super::{Queries, StoreError};

/// Ledger store over a PostgreSQL pool.
///
/// Holds no state of its own beyond the pool, so clones are cheap and may be
/// used from any number of tasks at once.
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Create a new Store with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check out a live connection for use with [`Queries::new`].
    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>, StoreError> {
        Ok(self.pool.acquire().await?)
    }

    // =========================================================================
    // Transactional executor
    // =========================================================================

    /// Run `unit_of_work` inside one database transaction.
    ///
    /// The unit of work is called exactly once with queries bound to the
    /// transaction. On `Ok` the transaction is committed and a commit failure
    /// is returned as [`StoreError::Commit`]. On `Err` it is rolled back and
    /// the error is returned unchanged, or wrapped in
    /// [`StoreError::Rollback`] together with the rollback failure.
    ///
    /// Dropping the returned future before it completes drops the open
    /// transaction, which rolls it back. Nothing is retried here.
    pub async fn exec_tx<T, F>(&self, unit_of_work: F) -> Result<T, StoreError>
    where
        T: Send,
        F: for<'c> FnOnce(Queries<'c>) -> BoxFuture<'c, Result<T, StoreError>> + Send,
    {
        let mut tx = self.pool.begin().await.map_err(StoreError::Begin)?;

        let outcome = unit_of_work(Queries::new(&mut *tx)).await;

        match outcome {
            Ok(value) => {
                tx.commit().await.map_err(StoreError::Commit)?;
                tracing::debug!("Transaction committed");
                Ok(value)
            }
            Err(cause) => {
                tracing::debug!("Rolling back transaction: {}", cause);
                if let Err(rollback) = tx.rollback().await {
                    return Err(StoreError::Rollback {
                        cause: Box::new(cause),
                        rollback,
                    });
                }
                Err(cause)
            }
        }
    }

    // =========================================================================
    // Reads and setup on a pooled connection
    // =========================================================================

    pub async fn create_account(&self, params: &CreateAccountParams) -> Result<Account, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(Queries::new(&mut conn).create_account(params).await?)
    }

    pub async fn get_account(&self, id: i64) -> Result<Account, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(Queries::new(&mut conn).get_account(id).await?)
    }

    pub async fn get_entry(&self, id: i64) -> Result<Entry, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(Queries::new(&mut conn).get_entry(id).await?)
    }

    pub async fn list_entries(&self, params: ListEntriesParams) -> Result<Vec<Entry>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(Queries::new(&mut conn).list_entries(params).await?)
    }

    pub async fn get_transfer(&self, id: i64) -> Result<Transfer, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(Queries::new(&mut conn).get_transfer(id).await?)
    }

    pub async fn list_transfers(
        &self,
        params: ListTransfersParams,
    ) -> Result<Vec<Transfer>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(Queries::new(&mut conn).list_transfers(params).await?)
    }
}
