//! In-process ownership registry.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use dockernest_common::types::{RecordId, UserId};

use crate::error::{RegistryError, Result};
use crate::record::{NewWorkloadRecord, WorkloadRecord};
use crate::store::OwnershipRegistry;

#[derive(Debug)]
struct MemoryState {
    next_id: i64,
    records: BTreeMap<RecordId, WorkloadRecord>,
}

/// Registry that keeps records in memory for the life of the process.
#[derive(Debug)]
pub struct MemoryRegistry {
    state: Mutex<MemoryState>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                next_id: 1,
                records: BTreeMap::new(),
            }),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| RegistryError::Unavailable {
            message: "registry lock poisoned".to_string(),
        })
    }

    /// Returns the total number of records across all owners.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.state()?.records.len())
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnershipRegistry for MemoryRegistry {
    fn find_by_owner(&self, owner: UserId) -> Result<Vec<WorkloadRecord>> {
        Ok(self
            .state()?
            .records
            .values()
            .filter(|r| r.owner() == owner)
            .cloned()
            .collect())
    }

    fn find_owned(&self, owner: UserId, id: RecordId) -> Result<Option<WorkloadRecord>> {
        Ok(self
            .state()?
            .records
            .get(&id)
            .filter(|r| r.owner() == owner)
            .cloned())
    }

    fn insert(&self, record: NewWorkloadRecord) -> Result<WorkloadRecord> {
        let mut state = self.state()?;
        let id = RecordId::new(state.next_id);
        state.next_id += 1;
        let record = record.into_record(id, chrono::Utc::now().to_rfc3339());
        let _ = state.records.insert(id, record.clone());
        Ok(record)
    }

    fn delete(&self, record: &WorkloadRecord) -> Result<bool> {
        let mut state = self.state()?;
        let owned = state
            .records
            .get(&record.id())
            .is_some_and(|r| r.owner() == record.owner());
        if owned {
            let _ = state.records.remove(&record.id());
        }
        Ok(owned)
    }
}
