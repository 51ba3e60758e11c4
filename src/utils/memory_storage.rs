//! In-memory snapshot storage for testing

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::reconciliation::EngineSnapshot;
use crate::traits::*;
use crate::types::*;

/// In-memory snapshot storage for testing and development
///
/// Clones share the same underlying map, like handles to one backend.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStorage {
    snapshots: Arc<RwLock<BTreeMap<String, EngineSnapshot>>>,
}

impl MemorySnapshotStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> ReconResult<()> {
        self.snapshots
            .write()
            .map_err(|_| ReconError::Storage("snapshot lock poisoned".to_string()))?
            .clear();
        Ok(())
    }
}

#[async_trait]
impl SnapshotStorage for MemorySnapshotStorage {
    async fn save_snapshot(&mut self, session: &str, snapshot: &EngineSnapshot) -> ReconResult<()> {
        if session.trim().is_empty() {
            return Err(ReconError::Storage("session key cannot be empty".to_string()));
        }
        self.snapshots
            .write()
            .map_err(|_| ReconError::Storage("snapshot lock poisoned".to_string()))?
            .insert(session.to_string(), snapshot.clone());
        Ok(())
    }

    async fn load_snapshot(&self, session: &str) -> ReconResult<Option<EngineSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .map_err(|_| ReconError::Storage("snapshot lock poisoned".to_string()))?
            .get(session)
            .cloned())
    }

    async fn delete_snapshot(&mut self, session: &str) -> ReconResult<()> {
        let removed = self
            .snapshots
            .write()
            .map_err(|_| ReconError::Storage("snapshot lock poisoned".to_string()))?
            .remove(session);
        match removed {
            Some(_) => Ok(()),
            None => Err(ReconError::NotFound(format!("session '{}'", session))),
        }
    }

    async fn list_sessions(&self) -> ReconResult<Vec<String>> {
        Ok(self
            .snapshots
            .read()
            .map_err(|_| ReconError::Storage("snapshot lock poisoned".to_string()))?
            .keys()
            .cloned()
            .collect())
    }
}
