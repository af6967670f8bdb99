//! Domain module
//!
//! Ledger rows and transfer request/result types.

pub mod models;
pub mod transfer;

pub use models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListEntriesParams, ListTransfersParams, Transfer,
};
pub use transfer::{TransferTxParams, TransferTxResult};
