//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::reconciliation::EngineSnapshot;
use crate::types::*;

/// Persistence abstraction for reconciliation sessions
///
/// The engine itself performs no I/O. Whatever keeps sessions across
/// restarts (local storage, a database, a backup file) implements this
/// trait and receives whole snapshots.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Save a snapshot under the given session key, replacing any previous one
    async fn save_snapshot(&mut self, session: &str, snapshot: &EngineSnapshot) -> ReconResult<()>;

    /// Load the snapshot for a session, if one was saved
    async fn load_snapshot(&self, session: &str) -> ReconResult<Option<EngineSnapshot>>;

    /// Remove a session's snapshot
    async fn delete_snapshot(&mut self, session: &str) -> ReconResult<()>;

    /// List known session keys
    async fn list_sessions(&self) -> ReconResult<Vec<String>>;
}

/// Trait for implementing custom bank entry validation rules
pub trait EntryValidator: Send + Sync {
    /// Reject malformed entries before ingestion
    fn validate_entry(&self, entry: &BankEntry) -> ReconResult<()>;

    /// Decide the validation status to attach to an accepted entry
    fn classify(&self, entry: &BankEntry) -> ValidationStatus;
}

/// Default bank entry validator with basic rules
pub struct DefaultEntryValidator;

impl EntryValidator for DefaultEntryValidator {
    fn validate_entry(&self, entry: &BankEntry) -> ReconResult<()> {
        if entry.id.trim().is_empty() {
            return Err(ReconError::Validation(
                "Bank entry id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn classify(&self, entry: &BankEntry) -> ValidationStatus {
        if entry.value.is_zero() {
            ValidationStatus::Invalid
        } else if entry.payment_type.trim().is_empty() || entry.document.is_none() {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Valid
        }
    }
}
