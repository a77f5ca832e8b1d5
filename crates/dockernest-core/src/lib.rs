//! # dockernest-core
//!
//! The lifecycle manager: every operation a user can perform on their
//! workloads, scoped by ownership and reconciled against live runtime state.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dockernest_common::types::UserId;
//! use dockernest_core::{CreateRequest, LifecycleManager};
//! use dockernest_registry::MemoryRegistry;
//! use dockernest_runtime::backend::InMemoryRuntime;
//!
//! # async fn demo() -> dockernest_common::error::Result<()> {
//! let manager = LifecycleManager::new(
//!     Arc::new(MemoryRegistry::new()),
//!     Arc::new(InMemoryRuntime::new()),
//! );
//! let owner = UserId::new(1);
//! let created = manager.create(owner, CreateRequest::new("web", "nginx")).await?;
//! let workloads = manager.list(owner).await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod manager;
pub mod view;

pub use self::manager::LifecycleManager;
pub use self::view::{CreateRequest, CreatedWorkload, WorkloadView};
pub use dockernest_runtime::client::NetworkSummary;
pub use dockernest_runtime::telemetry::{PortMap, WorkloadStats};
