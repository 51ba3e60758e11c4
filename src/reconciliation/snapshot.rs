//! Serializable engine state used for persistence and backup/restore

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 1;

/// A bank entry together with its insertion position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionedBankEntry {
    pub position: u64,
    pub entry: BankEntry,
}

/// Complete engine state: both collections, not-found history and audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub version: u32,
    pub exported_at: Option<NaiveDateTime>,
    pub bank_entries: Vec<PositionedBankEntry>,
    pub cash_entries: Vec<CashEntry>,
    pub not_found: Vec<NotFoundRecord>,
    pub action_log: Vec<ActionLogEntry>,
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at: None,
            bank_entries: Vec::new(),
            cash_entries: Vec::new(),
            not_found: Vec::new(),
            action_log: Vec::new(),
        }
    }
}

impl EngineSnapshot {
    /// Structural checks that do not need an engine
    pub fn validate(&self) -> ReconResult<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(ReconError::Validation(format!(
                "unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }

        for cash in &self.cash_entries {
            if let Some(origin_id) = cash.bank_entry_id() {
                if origin_id != cash.id {
                    return Err(ReconError::Validation(format!(
                        "cash entry '{}' references bank entry '{}'",
                        cash.id, origin_id
                    )));
                }
            }
        }
        Ok(())
    }
}
