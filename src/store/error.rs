//! Store Errors
//!
//! Error types for transactional ledger operations.

use std::borrow::Cow;
use std::fmt;

/// SQLSTATE raised when a serializable transaction loses a race
const SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE raised when the server breaks a lock cycle
const DEADLOCK_DETECTED: &str = "40P01";

/// SQLSTATE class for integrity constraint violations
const INTEGRITY_CONSTRAINT_CLASS: &str = "23";

/// The write of a transfer that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferStep {
    CreateTransfer,
    CreateFromEntry,
    CreateToEntry,
    AddFromBalance,
    AddToBalance,
}

impl fmt::Display for TransferStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferStep::CreateTransfer => "create transfer",
            TransferStep::CreateFromEntry => "create from entry",
            TransferStep::CreateToEntry => "create to entry",
            TransferStep::AddFromBalance => "add from account balance",
            TransferStep::AddToBalance => "add to account balance",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The connection could not start a transaction
    #[error("Failed to begin transaction: {0}")]
    Begin(#[source] sqlx::Error),

    /// A write of the transfer workflow failed
    #[error("Transfer step '{step}' failed: {source}")]
    Step {
        step: TransferStep,
        #[source]
        source: sqlx::Error,
    },

    /// Database error from a query outside the transfer workflow
    #[error("Database error: {0}")]
    Query(#[from] sqlx::Error),

    /// A unit of work gave up on its own
    #[error("Unit of work aborted: {0}")]
    Aborted(String),

    /// Rolling back after a failed unit of work failed as well.
    ///
    /// `source()` yields the rollback failure; the error that triggered the
    /// rollback is in `cause` and returned by [`StoreError::original`].
    #[error("{cause}; rollback failed: {rollback}")]
    Rollback {
        cause: Box<StoreError>,
        #[source]
        rollback: sqlx::Error,
    },

    /// The unit of work succeeded but nothing was committed
    #[error("Failed to commit transaction: {0}")]
    Commit(#[source] sqlx::Error),
}

impl StoreError {
    pub(crate) fn step(step: TransferStep) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| StoreError::Step { step, source }
    }

    /// The error that failed the unit of work, looking through rollback failures
    pub fn original(&self) -> &StoreError {
        match self {
            StoreError::Rollback { cause, .. } => cause.original(),
            other => other,
        }
    }

    /// The transfer write that failed, looking through rollback failures
    pub fn failed_step(&self) -> Option<TransferStep> {
        match self {
            StoreError::Step { step, .. } => Some(*step),
            StoreError::Rollback { cause, .. } => cause.failed_step(),
            _ => None,
        }
    }

    /// The underlying driver error that caused this failure
    pub fn sqlx_error(&self) -> Option<&sqlx::Error> {
        match self {
            StoreError::Begin(e)
            | StoreError::Query(e)
            | StoreError::Commit(e)
            | StoreError::Step { source: e, .. } => Some(e),
            StoreError::Rollback { cause, .. } => cause.sqlx_error(),
            StoreError::Aborted(_) => None,
        }
    }

    /// SQLSTATE of the underlying database error, if any
    pub fn database_code(&self) -> Option<Cow<'_, str>> {
        match self.sqlx_error()? {
            sqlx::Error::Database(db_err) => db_err.code(),
            _ => None,
        }
    }

    /// Check if the database aborted the transaction to keep it serializable
    pub fn is_serialization_failure(&self) -> bool {
        self.database_code().as_deref() == Some(SERIALIZATION_FAILURE)
    }

    /// Check if the database detected a deadlock
    pub fn is_deadlock(&self) -> bool {
        self.database_code().as_deref() == Some(DEADLOCK_DETECTED)
    }

    /// Check if a caller may retry the whole operation.
    ///
    /// The store itself never retries.
    pub fn is_retryable(&self) -> bool {
        self.is_serialization_failure() || self.is_deadlock()
    }

    /// Check if a check, foreign-key or unique constraint rejected a write
    pub fn is_constraint_violation(&self) -> bool {
        self.database_code()
            .is_some_and(|code| code.starts_with(INTEGRITY_CONSTRAINT_CLASS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_error_names_the_step() {
        let err = StoreError::step(TransferStep::AddToBalance)(sqlx::Error::RowNotFound);

        assert_eq!(err.failed_step(), Some(TransferStep::AddToBalance));
        assert!(err.to_string().contains("add to account balance"));
        assert!(!err.is_retryable());
        assert!(!err.is_constraint_violation());
    }

    #[test]
    fn test_rollback_error_keeps_both_causes() {
        let err = StoreError::Rollback {
            cause: Box::new(StoreError::Step {
                step: TransferStep::CreateFromEntry,
                source: sqlx::Error::RowNotFound,
            }),
            rollback: sqlx::Error::PoolClosed,
        };

        let message = err.to_string();
        assert!(message.contains("create from entry"));
        assert!(message.contains("rollback failed"));
        assert_eq!(err.failed_step(), Some(TransferStep::CreateFromEntry));
        assert!(matches!(err.sqlx_error(), Some(sqlx::Error::RowNotFound)));
        assert!(matches!(err.original(), StoreError::Step { .. }));

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), sqlx::Error::PoolClosed.to_string());

        match err {
            StoreError::Rollback { cause, rollback } => {
                assert!(matches!(*cause, StoreError::Step { .. }));
                assert!(matches!(rollback, sqlx::Error::PoolClosed));
            }
            other => panic!("Expected Rollback, got: {:?}", other),
        }
    }

    #[test]
    fn test_aborted_has_no_database_code() {
        let err = StoreError::Aborted("business rule".to_string());

        assert!(err.database_code().is_none());
        assert!(err.sqlx_error().is_none());
        assert!(err.failed_step().is_none());
        assert!(matches!(err.original(), StoreError::Aborted(_)));
        assert_eq!(err.to_string(), "Unit of work aborted: business rule");
    }

    #[test]
    fn test_begin_and_commit_are_distinguishable() {
        let begin = StoreError::Begin(sqlx::Error::PoolTimedOut);
        let commit = StoreError::Commit(sqlx::Error::PoolClosed);

        assert!(begin.to_string().starts_with("Failed to begin transaction"));
        assert!(commit.to_string().starts_with("Failed to commit transaction"));
        assert!(begin.failed_step().is_none());
    }
}
