//! # Reconciliation Core
//!
//! A reconciliation library for matching bank statement lines against a
//! cash register ("Conferência de Caixa") by monetary value.
//!
//! ## Features
//!
//! - **Exact money**: integer-cent values parsed from and rendered to BRL format (`1.234,56`)
//! - **Entry store**: disjoint bank and cash collections kept in insertion order
//! - **Matching**: exact and tolerance-based value matching with first-in-first-matched ties
//! - **Transfers and undo**: atomic moves between collections with an append-only audit trail
//! - **Not-found history**: every unsuccessful search is recorded
//! - **Snapshots**: serializable session state behind a pluggable storage trait
//!
//! ## Quick Start
//!
//! ```rust
//! use reconciliation_core::{BankEntry, Money, ReconciliationEngine, TransferResult};
//! use chrono::NaiveDate;
//!
//! let mut engine = ReconciliationEngine::new();
//! engine
//!     .ingest_bank_entries(vec![BankEntry::new(
//!         "1".to_string(),
//!         NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
//!         Money::parse("150,75").unwrap(),
//!         "PIX RECEBIDO".to_string(),
//!         "PIX de cliente".to_string(),
//!     )])
//!     .unwrap();
//!
//! let result = engine
//!     .search_and_transfer(Money::parse("150,75").unwrap(), None)
//!     .unwrap();
//! assert!(matches!(result, TransferResult::Transferred { .. }));
//! ```

pub mod config;
pub mod money;
pub mod reconciliation;
pub mod store;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use money::*;
pub use reconciliation::*;
pub use store::*;
pub use traits::*;
pub use types::*;
