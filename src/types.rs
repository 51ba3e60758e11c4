//! Core types and data structures for the reconciliation system

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::money::{Direction, Money};

/// Validation outcome attached to an ingested bank statement line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    #[default]
    Valid,
    /// Usable, but something looked off (missing document, blank type)
    Warning,
    /// Should not be reconciled as-is
    Invalid,
}

/// A line of a bank statement that has not been reconciled yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankEntry {
    /// Unique identifier, shared with the cash entry it becomes on transfer
    pub id: String,
    /// Statement date
    pub date: NaiveDate,
    /// Signed value (negative for outgoing lines)
    pub value: Money,
    /// Whether the line is a credit or a debit on the statement
    pub direction: Direction,
    /// Payment/transaction type, e.g. "PIX RECEBIDO"
    pub payment_type: String,
    /// Counterparty CPF/CNPJ when present on the statement
    pub document: Option<String>,
    /// Original history text from the statement
    pub description: String,
    /// Result of ingestion validation
    pub validation_status: ValidationStatus,
}

impl BankEntry {
    /// Create a new bank entry; the sign of `value` decides its direction
    pub fn new(
        id: String,
        date: NaiveDate,
        value: Money,
        payment_type: String,
        description: String,
    ) -> Self {
        Self {
            id,
            date,
            value,
            direction: Direction::of(value),
            payment_type,
            document: None,
            description,
            validation_status: ValidationStatus::Valid,
        }
    }

    /// Attach the counterparty document
    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }
}

/// How a cash entry came to exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CashSource {
    /// Moved over from the bank statement; keeps the original line for undo
    Transferred {
        origin: BankEntry,
        /// Insertion position the bank entry held before the transfer
        bank_position: u64,
    },
    /// Launched by hand at the register
    Manual,
}

/// A reconciled or manually registered cash-register line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashEntry {
    pub id: String,
    pub date: NaiveDate,
    /// Signed value, sign always agrees with `direction`
    pub value: Money,
    pub direction: Direction,
    pub description: String,
    pub source: CashSource,
    /// When the entry was created
    pub created_at: NaiveDateTime,
}

impl CashEntry {
    /// Create a manual launch with a freshly generated id
    pub fn manual(
        date: NaiveDate,
        value: Money,
        direction: Direction,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            value: direction.apply(value),
            direction,
            description: description.into(),
            source: CashSource::Manual,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Build the cash entry that a bank entry turns into on transfer
    pub fn from_transfer(origin: BankEntry, bank_position: u64) -> Self {
        Self {
            id: origin.id.clone(),
            date: origin.date,
            value: origin.value,
            direction: origin.direction,
            description: origin.description.clone(),
            source: CashSource::Transferred {
                origin,
                bank_position,
            },
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Id of the originating bank entry, if transferred
    pub fn bank_entry_id(&self) -> Option<&str> {
        match &self.source {
            CashSource::Transferred { origin, .. } => Some(&origin.id),
            CashSource::Manual => None,
        }
    }

    pub fn is_transferred(&self) -> bool {
        matches!(self.source, CashSource::Transferred { .. })
    }

    pub fn is_manual(&self) -> bool {
        matches!(self.source, CashSource::Manual)
    }
}

/// A search that found nothing acceptable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotFoundRecord {
    pub id: String,
    pub value: Money,
    pub searched_at: NaiveDateTime,
    /// Set only by an explicit user action
    pub resolved: bool,
}

impl NotFoundRecord {
    pub fn new(value: Money) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            value,
            searched_at: chrono::Utc::now().naive_utc(),
            resolved: false,
        }
    }
}

/// Kind of change recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Transfer,
    UndoTransfer,
    ManualAdd,
    UndoManual,
}

/// Append-only audit trail record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id: String,
    pub kind: ActionKind,
    /// Bank or cash entry the action touched
    pub entry_id: String,
    pub value: Money,
    pub timestamp: NaiveDateTime,
}

impl ActionLogEntry {
    pub fn new(kind: ActionKind, entry_id: String, value: Money) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            entry_id,
            value,
            timestamp: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Count and signed sum of a set of entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub count: usize,
    /// Net value: incoming minus outgoing
    pub total_value: Money,
    pub incoming: Money,
    /// Sum of outgoing values (negative or zero)
    pub outgoing: Money,
}

/// Errors that can occur in the reconciliation system
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Duplicate id: {0}")]
    DuplicateId(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for reconciliation operations
pub type ReconResult<T> = Result<T, ReconError>;
