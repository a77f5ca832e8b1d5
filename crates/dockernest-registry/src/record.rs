//! Workload record types.

use dockernest_common::types::{RecordId, RuntimeId, UserId};
use serde::Serialize;

/// A persisted workload record.
///
/// Only registries construct records, so holding one proves it came from
/// an owner-scoped lookup or insert. All fields are immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadRecord {
    id: RecordId,
    name: String,
    image: String,
    runtime_id: Option<RuntimeId>,
    owner: UserId,
    created_at: String,
}

impl WorkloadRecord {
    pub(crate) const fn from_parts(
        id: RecordId,
        name: String,
        image: String,
        runtime_id: Option<RuntimeId>,
        owner: UserId,
        created_at: String,
    ) -> Self {
        Self {
            id,
            name,
            image,
            runtime_id,
            owner,
            created_at,
        }
    }

    /// Registry-assigned identifier.
    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.id
    }

    /// User-chosen display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Image reference.
    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Handle of the runtime object, if one was recorded.
    #[must_use]
    pub const fn runtime_id(&self) -> Option<&RuntimeId> {
        self.runtime_id.as_ref()
    }

    /// Owning user.
    #[must_use]
    pub const fn owner(&self) -> UserId {
        self.owner
    }

    /// RFC 3339 creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> &str {
        &self.created_at
    }
}

/// A record to insert, before the registry assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkloadRecord {
    /// Owning user.
    pub owner: UserId,
    /// User-chosen display name.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Handle returned by the runtime on creation.
    pub runtime_id: RuntimeId,
}

impl NewWorkloadRecord {
    pub(crate) fn into_record(self, id: RecordId, created_at: String) -> WorkloadRecord {
        WorkloadRecord::from_parts(
            id,
            self.name,
            self.image,
            Some(self.runtime_id),
            self.owner,
            created_at,
        )
    }
}
