//! Reconciliation engine: match, transfer, undo and audit

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::EngineConfig;
use crate::money::{Direction, Money};
use crate::reconciliation::matcher::{MatchCandidate, MatchKind, MatchOutcome, Matcher};
use crate::reconciliation::snapshot::{EngineSnapshot, PositionedBankEntry, SNAPSHOT_VERSION};
use crate::store::{EntryFilter, EntryStore};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_manual_entry;

/// Outcome of a search-and-transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransferResult {
    Transferred {
        cash_entry_id: String,
        kind: MatchKind,
        /// Distance between the searched value and the matched entry, in cents
        difference: u64,
    },
    /// No acceptable match; a not-found record was appended
    NotFound { record: NotFoundRecord },
}

impl TransferResult {
    pub fn is_transferred(&self) -> bool {
        matches!(self, TransferResult::Transferred { .. })
    }

    pub fn cash_entry_id(&self) -> Option<&str> {
        match self {
            TransferResult::Transferred { cash_entry_id, .. } => Some(cash_entry_id),
            TransferResult::NotFound { .. } => None,
        }
    }
}

/// Aggregate figures for a reconciliation session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub bank: Totals,
    pub cash: Totals,
    pub transferred_count: usize,
    pub manual_count: usize,
    pub invalid_bank_count: usize,
    pub unresolved_not_found: usize,
    pub actions_logged: usize,
}

/// Count and net value of a set of cash entries
pub fn compute_totals(entries: &[CashEntry]) -> ReconResult<Totals> {
    totals_of(entries.iter().map(|e| e.value))
}

fn totals_of<I: Iterator<Item = Money>>(mut values: I) -> ReconResult<Totals> {
    values.try_fold(Totals::default(), |mut acc, value| {
        acc.count += 1;
        acc.total_value = add_checked(acc.total_value, value)?;
        match Direction::of(value) {
            Direction::Incoming => acc.incoming = add_checked(acc.incoming, value)?,
            Direction::Outgoing => acc.outgoing = add_checked(acc.outgoing, value)?,
        }
        Ok(acc)
    })
}

fn add_checked(total: Money, value: Money) -> ReconResult<Money> {
    total
        .checked_add(value)
        .ok_or_else(|| ReconError::Validation(format!("total out of range adding {}", value)))
}

/// Main reconciliation engine for a single session
///
/// Construct one per session and hand it to whatever drives the UI; it
/// holds no global state. Every mutating operation either completes fully
/// or returns an error without changing anything.
pub struct ReconciliationEngine {
    store: EntryStore,
    not_found: Vec<NotFoundRecord>,
    action_log: Vec<ActionLogEntry>,
    config: EngineConfig,
    validator: Box<dyn EntryValidator>,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationEngine {
    /// Create an engine with the default (exact-only) policy
    pub fn new() -> Self {
        Self {
            store: EntryStore::new(),
            not_found: Vec::new(),
            action_log: Vec::new(),
            config: EngineConfig::default(),
            validator: Box::new(DefaultEntryValidator),
        }
    }

    /// Create an engine with a custom configuration
    pub fn with_config(config: EngineConfig) -> ReconResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Create an engine with a custom configuration and entry validator
    pub fn with_validator(
        config: EngineConfig,
        validator: Box<dyn EntryValidator>,
    ) -> ReconResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            validator,
            ..Self::new()
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read-only access to the underlying collections
    pub fn store(&self) -> &EntryStore {
        &self.store
    }

    // Ingestion
    /// Validate, classify and insert a parsed statement
    ///
    /// The batch is rejected as a whole on the first invalid entry or id
    /// collision.
    #[instrument(skip(self, entries), fields(batch = entries.len()))]
    pub fn ingest_bank_entries(&mut self, mut entries: Vec<BankEntry>) -> ReconResult<usize> {
        for entry in &mut entries {
            self.validator.validate_entry(entry)?;
            entry.validation_status = self.validator.classify(entry);
        }
        let count = entries.len();
        self.store.add_bank_entries(entries).inspect_err(|e| {
            warn!(error = %e, "statement batch rejected");
        })?;
        info!(count, "bank entries ingested");
        Ok(count)
    }

    /// Insert already-classified entries as-is
    pub fn add_bank_entries(&mut self, entries: Vec<BankEntry>) -> ReconResult<()> {
        self.store.add_bank_entries(entries)
    }

    pub fn set_validation_status(&mut self, id: &str, status: ValidationStatus) -> ReconResult<()> {
        self.store.set_validation_status(id, status)
    }

    // Queries
    pub fn list_bank_entries(&self, filter: Option<&EntryFilter>) -> Vec<BankEntry> {
        self.store.list_bank_entries(filter)
    }

    pub fn list_cash_entries(&self, filter: Option<&EntryFilter>) -> Vec<CashEntry> {
        self.store.list_cash_entries(filter)
    }

    /// Ranked candidates for a value without changing anything
    pub fn search(&self, target: Money, tolerance: Option<u64>) -> ReconResult<Vec<MatchCandidate>> {
        let tolerance = self.config.resolve_tolerance(tolerance)?;
        Ok(Matcher::with_tolerance(tolerance).rank(target, self.store.bank_entries()))
    }

    // Transfers
    /// Find the best bank entry for `target` and move it to the cash register
    ///
    /// When nothing matches, a not-found record is appended and returned
    /// instead of an error.
    #[instrument(skip(self, target), fields(value = %target))]
    pub fn search_and_transfer(
        &mut self,
        target: Money,
        tolerance: Option<u64>,
    ) -> ReconResult<TransferResult> {
        let tolerance = self.config.resolve_tolerance(tolerance)?;
        let outcome = Matcher::with_tolerance(tolerance).find(target, self.store.bank_entries());

        let (entry_id, kind, difference) = match outcome {
            MatchOutcome::Exact { entry_id } => (entry_id, MatchKind::Exact, 0),
            MatchOutcome::Approximate {
                entry_id,
                difference,
            } => (entry_id, MatchKind::Approximate, difference),
            MatchOutcome::NoMatchFound => {
                let record = self.record_not_found(target);
                info!(tolerance, "no bank entry matched");
                return Ok(TransferResult::NotFound { record });
            }
        };

        let cash = self.commit_transfer(&entry_id)?;
        debug!(entry_id = %cash.id, ?kind, difference, "matched bank entry");
        Ok(TransferResult::Transferred {
            cash_entry_id: cash.id,
            kind,
            difference,
        })
    }

    /// Move a specific bank entry chosen by the user
    #[instrument(skip(self))]
    pub fn transfer_entry(&mut self, bank_entry_id: &str) -> ReconResult<CashEntry> {
        self.commit_transfer(bank_entry_id)
    }

    fn commit_transfer(&mut self, bank_entry_id: &str) -> ReconResult<CashEntry> {
        let cash = self.store.transfer_to_cash(bank_entry_id)?;
        self.action_log.push(ActionLogEntry::new(
            ActionKind::Transfer,
            cash.id.clone(),
            cash.value,
        ));
        info!(entry_id = %cash.id, value = %cash.value, "transferred to cash register");
        Ok(cash)
    }

    /// Reverse a transfer, putting the bank entry back where it was
    ///
    /// Fails with `NotFound` for unknown ids, manual entries and transfers
    /// that were already undone.
    #[instrument(skip(self))]
    pub fn undo_transfer(&mut self, cash_entry_id: &str) -> ReconResult<BankEntry> {
        let restored = self.store.restore_to_bank(cash_entry_id).inspect_err(|_| {
            warn!(cash_entry_id, "undo rejected: no transferred cash entry");
        })?;
        self.action_log.push(ActionLogEntry::new(
            ActionKind::UndoTransfer,
            restored.id.clone(),
            restored.value,
        ));
        info!(entry_id = %restored.id, value = %restored.value, "transfer undone");
        Ok(restored)
    }

    // Manual launches
    /// Register a cash entry launched by hand, bypassing the matcher
    #[instrument(skip(self, entry), fields(entry_id = %entry.id, value = %entry.value))]
    pub fn add_manual_entry(&mut self, entry: CashEntry) -> ReconResult<String> {
        validate_manual_entry(&entry)?;
        let id = entry.id.clone();
        let value = entry.value;
        self.store.add_cash_entry(entry)?;
        self.action_log
            .push(ActionLogEntry::new(ActionKind::ManualAdd, id.clone(), value));
        info!("manual launch registered");
        Ok(id)
    }

    /// Remove a manual launch
    #[instrument(skip(self))]
    pub fn undo_manual(&mut self, cash_entry_id: &str) -> ReconResult<CashEntry> {
        match self.store.get_cash_entry(cash_entry_id) {
            Some(entry) if entry.is_manual() => {}
            _ => {
                return Err(ReconError::NotFound(format!(
                    "manual cash entry '{}'",
                    cash_entry_id
                )))
            }
        }
        let removed = self.store.remove_cash_entry(cash_entry_id)?;
        self.action_log.push(ActionLogEntry::new(
            ActionKind::UndoManual,
            removed.id.clone(),
            removed.value,
        ));
        info!(value = %removed.value, "manual launch removed");
        Ok(removed)
    }

    // Not-found history
    fn record_not_found(&mut self, value: Money) -> NotFoundRecord {
        let record = NotFoundRecord::new(value);
        self.not_found.push(record.clone());
        self.trim_not_found();
        record
    }

    // Oldest records go first once the configured limit is exceeded
    fn trim_not_found(&mut self) {
        if let Some(limit) = self.config.not_found_history_limit {
            if self.not_found.len() > limit {
                let excess = self.not_found.len() - limit;
                debug!(dropped = excess, "not-found history trimmed");
                self.not_found.drain(..excess);
            }
        }
    }

    pub fn not_found_records(&self) -> &[NotFoundRecord] {
        &self.not_found
    }

    /// Mark a not-found record as handled by the user
    pub fn resolve_not_found(&mut self, record_id: &str) -> ReconResult<()> {
        let record = self
            .not_found
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| ReconError::NotFound(format!("not-found record '{}'", record_id)))?;
        record.resolved = true;
        Ok(())
    }

    /// Drop every not-found record; entries are untouched
    pub fn clear_not_found_history(&mut self) {
        debug!(cleared = self.not_found.len(), "not-found history cleared");
        self.not_found.clear();
    }

    pub fn action_log(&self) -> &[ActionLogEntry] {
        &self.action_log
    }

    // Aggregates
    pub fn compute_totals(&self, entries: &[CashEntry]) -> ReconResult<Totals> {
        compute_totals(entries)
    }

    pub fn cash_totals(&self) -> ReconResult<Totals> {
        totals_of(self.store.cash_entries().map(|e| e.value))
    }

    pub fn bank_totals(&self) -> ReconResult<Totals> {
        totals_of(self.store.bank_entries().map(|e| e.value))
    }

    /// Bank total plus the value of transferred cash entries
    ///
    /// Stays constant across any sequence of transfers and undos.
    pub fn conserved_total(&self) -> ReconResult<Money> {
        let transferred = totals_of(
            self.store
                .cash_entries()
                .filter(|e| e.is_transferred())
                .map(|e| e.value),
        )?;
        add_checked(self.bank_totals()?.total_value, transferred.total_value)
    }

    pub fn statistics(&self) -> ReconResult<Statistics> {
        let transferred_count = self
            .store
            .cash_entries()
            .filter(|e| e.is_transferred())
            .count();
        Ok(Statistics {
            bank: self.bank_totals()?,
            cash: self.cash_totals()?,
            transferred_count,
            manual_count: self.store.cash_len() - transferred_count,
            invalid_bank_count: self
                .store
                .bank_entries()
                .filter(|e| e.validation_status == ValidationStatus::Invalid)
                .count(),
            unresolved_not_found: self.not_found.iter().filter(|r| !r.resolved).count(),
            actions_logged: self.action_log.len(),
        })
    }

    // Snapshots
    pub fn export_state(&self) -> EngineSnapshot {
        EngineSnapshot {
            version: SNAPSHOT_VERSION,
            exported_at: Some(chrono::Utc::now().naive_utc()),
            bank_entries: self
                .store
                .positioned_bank_entries()
                .map(|(position, entry)| PositionedBankEntry {
                    position,
                    entry: entry.clone(),
                })
                .collect(),
            cash_entries: self.store.cash_entries().cloned().collect(),
            not_found: self.not_found.clone(),
            action_log: self.action_log.clone(),
        }
    }

    /// Replace the whole session state; on error the current state is kept
    #[instrument(skip(self, snapshot), fields(bank = snapshot.bank_entries.len(), cash = snapshot.cash_entries.len()))]
    pub fn import_state(&mut self, snapshot: EngineSnapshot) -> ReconResult<()> {
        snapshot.validate()?;
        let store = EntryStore::from_parts(
            snapshot
                .bank_entries
                .into_iter()
                .map(|p| (p.position, p.entry))
                .collect(),
            snapshot.cash_entries,
        )?;

        self.store = store;
        self.not_found = snapshot.not_found;
        self.trim_not_found();
        self.action_log = snapshot.action_log;
        info!("session state imported");
        Ok(())
    }

    /// Save the current state through a persistence backend
    pub async fn persist<S: SnapshotStorage>(&self, storage: &mut S, session: &str) -> ReconResult<()> {
        storage.save_snapshot(session, &self.export_state()).await
    }

    /// Load a session's state; returns false when nothing was saved
    pub async fn restore<S: SnapshotStorage>(&mut self, storage: &S, session: &str) -> ReconResult<bool> {
        match storage.load_snapshot(session).await? {
            Some(snapshot) => {
                self.import_state(snapshot)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
