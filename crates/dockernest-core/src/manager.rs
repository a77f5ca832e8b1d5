//! Ownership-scoped workload lifecycle manager.
//!
//! Every operation that targets a record starts with an owner-scoped
//! registry lookup, so a record owned by someone else is indistinguishable
//! from one that does not exist. Execution state is never cached: each read
//! goes back to the runtime. Registry calls may block on disk, so they run
//! on tokio's blocking pool.

use std::fmt;
use std::sync::Arc;

use dockernest_common::config::DockernestConfig;
use dockernest_common::constants::{DEFAULT_LOG_TAIL_LINES, DEFAULT_NETWORK};
use dockernest_common::error::{LifecycleError, Result};
use dockernest_common::types::{RecordId, RuntimeId, UserId};
use dockernest_registry::error::{RegistryError, Result as RegistryResult};
use dockernest_registry::{NewWorkloadRecord, OwnershipRegistry, WorkloadRecord};
use dockernest_runtime::client::{NetworkSummary, RuntimeClient, runtime_name};
use dockernest_runtime::error::RuntimeError;
use dockernest_runtime::telemetry::{self, WorkloadStats};
use tracing::{debug, error, info, warn};

use crate::view::{CreateRequest, CreatedWorkload, WorkloadView};

/// Placeholder reported for records that never received a runtime handle.
const UNASSIGNED_RUNTIME_ID: &str = "unassigned";

/// Runtime actions that are plain dispatch after the ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Start,
    Stop,
    Restart,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::Stop => write!(f, "stop"),
            Self::Restart => write!(f, "restart"),
        }
    }
}

/// Coordinates the ownership registry and the runtime client.
///
/// Both collaborators are injected, so the manager holds no process-wide
/// state and any number of managers can coexist.
pub struct LifecycleManager {
    registry: Arc<dyn OwnershipRegistry>,
    runtime: Arc<dyn RuntimeClient>,
    default_network: String,
    log_tail_lines: usize,
}

impl fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("default_network", &self.default_network)
            .field("log_tail_lines", &self.log_tail_lines)
            .finish_non_exhaustive()
    }
}

impl LifecycleManager {
    /// Creates a manager with the default network and log tail.
    #[must_use]
    pub fn new(registry: Arc<dyn OwnershipRegistry>, runtime: Arc<dyn RuntimeClient>) -> Self {
        Self {
            registry,
            runtime,
            default_network: DEFAULT_NETWORK.to_string(),
            log_tail_lines: DEFAULT_LOG_TAIL_LINES,
        }
    }

    /// Creates a manager using the network and log tail from `config`.
    #[must_use]
    pub fn with_config(
        registry: Arc<dyn OwnershipRegistry>,
        runtime: Arc<dyn RuntimeClient>,
        config: &DockernestConfig,
    ) -> Self {
        Self {
            default_network: config.default_network.clone(),
            log_tail_lines: config.log_tail_lines,
            ..Self::new(registry, runtime)
        }
    }

    /// Lists the caller's workloads with freshly observed state.
    ///
    /// A record whose runtime object is gone is reported with status
    /// `not found`, no ports, and network `unknown`.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read or the runtime fails
    /// for a reason other than a missing object.
    pub async fn list(&self, user: UserId) -> Result<Vec<WorkloadView>> {
        let records = self
            .registry_call(move |registry| registry.find_by_owner(user))
            .await
            .map_err(registry_failure)?;
        debug!(user_id = %user, count = records.len(), "listing workloads");
        futures::future::try_join_all(records.iter().map(|record| self.observe(record))).await
    }

    /// Validates the request, runs the workload, and records it.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` before touching the runtime if `name` or
    /// `image` is blank, `RuntimeConflict` if the derived runtime name is
    /// taken, and `PartialCreateFailure` if the workload runs but its record
    /// cannot be stored.
    pub async fn create(&self, user: UserId, request: CreateRequest) -> Result<CreatedWorkload> {
        request.validate()?;
        let spec = request.into_spec(user, &self.default_network);
        let name = spec.runtime_name();

        let handle = self.runtime.create(&spec).await.map_err(|err| match err {
            RuntimeError::Conflict => LifecycleError::RuntimeConflict { name: name.clone() },
            RuntimeError::Unavailable(detail) => LifecycleError::RuntimeUnavailable { detail },
            other => LifecycleError::operation_failed(other),
        })?;

        let new_record = NewWorkloadRecord {
            owner: user,
            name: spec.name.clone(),
            image: spec.image.clone(),
            runtime_id: handle.id.clone(),
        };
        let inserted = self
            .registry_call(move |registry| registry.insert(new_record))
            .await;
        let record = inserted.map_err(|err| {
            error!(
                user_id = %user,
                runtime_id = %handle.id,
                runtime_name = %handle.name,
                error = %err,
                "workload created but not recorded; runtime object is orphaned"
            );
            LifecycleError::PartialCreateFailure {
                runtime_id: handle.id.to_string(),
                detail: err.to_string(),
            }
        })?;

        info!(
            user_id = %user,
            record_id = %record.id(),
            runtime_id = %handle.id,
            name = %record.name(),
            "workload created"
        );
        Ok(CreatedWorkload {
            id: record.id(),
            name: record.name().to_string(),
            image: record.image().to_string(),
            runtime_id: handle.id,
            runtime_name: handle.name,
        })
    }

    /// Stops and removes the workload, then forgets the record.
    ///
    /// Runtime cleanup is best effort: a missing object counts as removed,
    /// and any other runtime failure is logged. The record is deleted either
    /// way, since an untracked workload is the desired end state.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if the caller owns no such record, or
    /// `OperationFailed` if the registry cannot be written.
    pub async fn delete(&self, user: UserId, id: RecordId) -> Result<()> {
        let record = self.owned(user, id).await?;

        if let Some(runtime_id) = record.runtime_id() {
            match self.runtime.stop(runtime_id).await {
                Ok(()) | Err(RuntimeError::NotFound) => {}
                Err(err) => {
                    warn!(runtime_id = %runtime_id, error = %err, "stop before remove failed");
                }
            }
            match self.runtime.remove(runtime_id).await {
                Ok(()) | Err(RuntimeError::NotFound) => {}
                Err(err) => {
                    warn!(
                        user_id = %user,
                        record_id = %id,
                        runtime_id = %runtime_id,
                        error = %err,
                        "runtime object could not be removed; forgetting record anyway"
                    );
                }
            }
        }

        let target = record.clone();
        let deleted = self
            .registry_call(move |registry| registry.delete(&target))
            .await
            .map_err(registry_failure)?;
        if !deleted {
            debug!(record_id = %id, "record already deleted concurrently");
        }
        info!(user_id = %user, record_id = %id, name = %record.name(), "workload deleted");
        Ok(())
    }

    /// Starts a stopped workload.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if the caller owns no such record and
    /// `RuntimeObjectNotFound` if its runtime object is gone.
    pub async fn start(&self, user: UserId, id: RecordId) -> Result<()> {
        self.dispatch(user, id, Action::Start).await
    }

    /// Stops a workload. A missing runtime object counts as stopped.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if the caller owns no such record.
    pub async fn stop(&self, user: UserId, id: RecordId) -> Result<()> {
        self.dispatch(user, id, Action::Stop).await
    }

    /// Restarts a workload.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if the caller owns no such record and
    /// `RuntimeObjectNotFound` if its runtime object is gone.
    pub async fn restart(&self, user: UserId, id: RecordId) -> Result<()> {
        self.dispatch(user, id, Action::Restart).await
    }

    /// Returns the tail of the workload's output. Empty output is a success.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if the caller owns no such record and
    /// `RuntimeObjectNotFound` if its runtime object is gone.
    pub async fn logs(&self, user: UserId, id: RecordId) -> Result<String> {
        let record = self.owned(user, id).await?;
        let runtime_id = attached(&record)?;
        self.runtime
            .logs(runtime_id, self.log_tail_lines)
            .await
            .map_err(|err| runtime_failure(err, &record))
    }

    /// Takes one usage sample and normalizes it.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if the caller owns no such record,
    /// `RuntimeObjectNotFound` if its runtime object is gone, and
    /// `OperationFailed` for any other failure.
    pub async fn stats(&self, user: UserId, id: RecordId) -> Result<WorkloadStats> {
        let record = self.owned(user, id).await?;
        let runtime_id = attached(&record)?;
        let sample = self.runtime.stats(runtime_id).await.map_err(|err| match err {
            RuntimeError::NotFound => LifecycleError::RuntimeObjectNotFound {
                runtime_id: runtime_id.to_string(),
            },
            other => LifecycleError::operation_failed(other),
        })?;
        telemetry::normalize_stats(&sample).map_err(LifecycleError::operation_failed)
    }

    /// Creates a runtime network on behalf of `user`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` for a blank name, `RuntimeConflict` if the
    /// name is taken, and `OperationFailed` for any other failure.
    pub async fn create_network(&self, user: UserId, name: &str) -> Result<NetworkSummary> {
        if name.trim().is_empty() {
            return Err(LifecycleError::ValidationFailed { field: "name" });
        }
        let network = self.runtime.create_network(name).await.map_err(|err| match err {
            RuntimeError::Conflict => LifecycleError::RuntimeConflict {
                name: name.to_string(),
            },
            other => LifecycleError::operation_failed(other),
        })?;
        info!(user_id = %user, network = %network.name, "network created");
        Ok(network)
    }

    /// Lists runtime networks.
    ///
    /// # Errors
    ///
    /// Returns `OperationFailed` if the runtime cannot list networks.
    pub async fn list_networks(&self, user: UserId) -> Result<Vec<NetworkSummary>> {
        debug!(user_id = %user, "listing networks");
        self.runtime
            .list_networks()
            .await
            .map_err(LifecycleError::operation_failed)
    }

    /// The single entry point for record access.
    async fn owned(&self, user: UserId, id: RecordId) -> Result<WorkloadRecord> {
        self.registry_call(move |registry| registry.find_owned(user, id))
            .await
            .map_err(registry_failure)?
            .ok_or(LifecycleError::RecordNotFound)
    }

    /// Runs a registry operation on the blocking pool.
    async fn registry_call<T, F>(&self, op: F) -> RegistryResult<T>
    where
        F: FnOnce(&dyn OwnershipRegistry) -> RegistryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || op(registry.as_ref()))
            .await
            .map_err(|err| RegistryError::Unavailable {
                message: format!("registry task failed: {err}"),
            })?
    }

    async fn observe(&self, record: &WorkloadRecord) -> Result<WorkloadView> {
        let Some(runtime_id) = record.runtime_id() else {
            return Ok(WorkloadView::observe(record, None));
        };
        match self.runtime.inspect(runtime_id).await {
            Ok(inspection) => Ok(WorkloadView::observe(record, Some(&inspection))),
            Err(RuntimeError::NotFound) => {
                warn!(
                    record_id = %record.id(),
                    runtime_id = %runtime_id,
                    "runtime object missing; reporting degraded status"
                );
                Ok(WorkloadView::observe(record, None))
            }
            Err(err) => Err(runtime_failure(err, record)),
        }
    }

    async fn dispatch(&self, user: UserId, id: RecordId, action: Action) -> Result<()> {
        let record = self.owned(user, id).await?;
        let Some(runtime_id) = record.runtime_id() else {
            return match action {
                Action::Stop => Ok(()),
                Action::Start | Action::Restart => Err(unassigned()),
            };
        };

        let result = match action {
            Action::Start => self.runtime.start(runtime_id).await,
            Action::Stop => self.runtime.stop(runtime_id).await,
            Action::Restart => self.runtime.restart(runtime_id).await,
        };
        result.map_err(|err| runtime_failure(err, &record))?;

        info!(
            user_id = %user,
            record_id = %id,
            runtime_id = %runtime_id,
            action = %action,
            "workload action dispatched"
        );
        Ok(())
    }
}

/// Returns the record's runtime handle, or `RuntimeObjectNotFound`.
fn attached(record: &WorkloadRecord) -> Result<&RuntimeId> {
    record.runtime_id().ok_or_else(unassigned)
}

fn unassigned() -> LifecycleError {
    LifecycleError::RuntimeObjectNotFound {
        runtime_id: UNASSIGNED_RUNTIME_ID.to_string(),
    }
}

/// Translates an adapter failure on an existing record.
fn runtime_failure(err: RuntimeError, record: &WorkloadRecord) -> LifecycleError {
    match err {
        RuntimeError::NotFound => LifecycleError::RuntimeObjectNotFound {
            runtime_id: record
                .runtime_id()
                .map_or_else(|| UNASSIGNED_RUNTIME_ID.to_string(), ToString::to_string),
        },
        RuntimeError::Conflict => LifecycleError::RuntimeConflict {
            name: runtime_name(record.name(), record.owner()),
        },
        RuntimeError::Unavailable(detail) => LifecycleError::RuntimeUnavailable { detail },
        RuntimeError::Rejected(reason) => LifecycleError::OperationFailed { detail: reason },
    }
}

fn registry_failure(err: RegistryError) -> LifecycleError {
    LifecycleError::operation_failed(err)
}
