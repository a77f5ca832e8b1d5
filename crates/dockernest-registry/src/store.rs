//! The ownership registry contract.

use dockernest_common::types::{RecordId, UserId};

use crate::error::Result;
use crate::record::{NewWorkloadRecord, WorkloadRecord};

/// Durable mapping from workload records to their owners.
///
/// Implementations provide their own per-record isolation. Deleting an
/// already-deleted record is not an error.
pub trait OwnershipRegistry: Send + Sync {
    /// Returns every record owned by `owner`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn find_by_owner(&self, owner: UserId) -> Result<Vec<WorkloadRecord>>;

    /// Returns the record `id` if and only if `owner` owns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn find_owned(&self, owner: UserId, id: RecordId) -> Result<Option<WorkloadRecord>>;

    /// Persists a record and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn insert(&self, record: NewWorkloadRecord) -> Result<WorkloadRecord>;

    /// Deletes a record, returning whether it was still present.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn delete(&self, record: &WorkloadRecord) -> Result<bool>;
}
