//! Ownership registry for DockerNest workloads.
//!
//! The registry is the source of truth for which user owns which workload
//! record. Every lookup is scoped by owner; there is no way to fetch a
//! record by id alone.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod error;
pub mod memory;
pub mod record;
pub mod sqlite;
pub mod store;

pub use self::memory::MemoryRegistry;
pub use self::record::{NewWorkloadRecord, WorkloadRecord};
pub use self::sqlite::SqliteRegistry;
pub use self::store::OwnershipRegistry;
