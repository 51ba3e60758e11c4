//! Entry storage for bank statement and cash register lines

pub mod entry_store;

pub use entry_store::*;
