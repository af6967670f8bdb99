//! simple_bank Library
//!
//! Atomic, deadlock-safe money transfers over a PostgreSQL ledger.

pub mod config;
pub mod db;
pub mod domain;
pub mod store;

pub use config::{Config, ConfigError};
pub use domain::{Account, Entry, Transfer, TransferTxParams, TransferTxResult};
pub use store::{Queries, Store, StoreError, TransferStep};
