//! Single-writer handle for engines shared across threads

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::money::Money;
use crate::reconciliation::engine::{ReconciliationEngine, Statistics, TransferResult};
use crate::reconciliation::snapshot::EngineSnapshot;
use crate::types::*;

/// Cloneable handle that serializes every engine call through one lock
///
/// Two callers racing to transfer or undo the same id are ordered by the
/// lock: the first succeeds, the second gets `NotFound`.
#[derive(Clone, Default)]
pub struct SharedEngine {
    inner: Arc<Mutex<ReconciliationEngine>>,
}

impl SharedEngine {
    pub fn new(engine: ReconciliationEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    // Engine operations never leave partial state behind, so a poisoned
    // lock still guards a consistent engine.
    fn lock(&self) -> MutexGuard<'_, ReconciliationEngine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run an arbitrary sequence of calls under one lock acquisition
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ReconciliationEngine) -> R,
    {
        f(&mut self.lock())
    }

    pub fn search_and_transfer(
        &self,
        target: Money,
        tolerance: Option<u64>,
    ) -> ReconResult<TransferResult> {
        self.lock().search_and_transfer(target, tolerance)
    }

    pub fn transfer_entry(&self, bank_entry_id: &str) -> ReconResult<CashEntry> {
        self.lock().transfer_entry(bank_entry_id)
    }

    pub fn undo_transfer(&self, cash_entry_id: &str) -> ReconResult<BankEntry> {
        self.lock().undo_transfer(cash_entry_id)
    }

    pub fn add_manual_entry(&self, entry: CashEntry) -> ReconResult<String> {
        self.lock().add_manual_entry(entry)
    }

    pub fn undo_manual(&self, cash_entry_id: &str) -> ReconResult<CashEntry> {
        self.lock().undo_manual(cash_entry_id)
    }

    pub fn statistics(&self) -> ReconResult<Statistics> {
        self.lock().statistics()
    }

    pub fn export_state(&self) -> EngineSnapshot {
        self.lock().export_state()
    }

    pub fn import_state(&self, snapshot: EngineSnapshot) -> ReconResult<()> {
        self.lock().import_state(snapshot)
    }
}
