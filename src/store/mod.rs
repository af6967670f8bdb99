//! Store module
//!
//! Transactional persistence for the ledger: the data-access handle, the
//! transaction executor and the transfer workflow built on it.

mod error;
mod queries;
mod repository;
mod transfer;

pub use error::{StoreError, TransferStep};
pub use queries::Queries;
pub use repository::Store;
pub use transfer::{balance_updates, BalanceUpdate, Leg};
