//! Reconciliation of bank statement lines against the cash register
//!
//! The [`Matcher`] finds bank entries by value, the [`ReconciliationEngine`]
//! moves them into the cash collection and keeps an auditable, reversible
//! trail of every move.

pub mod engine;
pub mod matcher;
pub mod shared;
pub mod snapshot;

pub use engine::*;
pub use matcher::*;
pub use shared::*;
pub use snapshot::*;
