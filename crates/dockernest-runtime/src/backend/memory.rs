//! In-memory runtime used as a test double.
//!
//! Behaves like a daemon with respect to naming conflicts and absent
//! objects, and lets tests simulate out-of-band changes: external removal,
//! state drift, and an unreachable daemon.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dockernest_common::types::{RuntimeId, WorkloadStatus};

use crate::client::{
    HostBinding, NetworkSummary, RawInspection, RawStatsSample, RuntimeClient, RuntimeHandle,
    WorkloadSpec,
};
use crate::error::{Result, RuntimeError};

/// A workload held by the [`InMemoryRuntime`].
#[derive(Debug, Clone, PartialEq)]
pub struct FakeWorkload {
    /// Runtime-facing name.
    pub name: String,
    /// Spec the workload was created from.
    pub spec: WorkloadSpec,
    /// Current state.
    pub status: WorkloadStatus,
    /// Full log output.
    pub logs: String,
    /// Sample returned by `stats`.
    pub stats: RawStatsSample,
}

#[derive(Debug, Default)]
struct FakeState {
    workloads: BTreeMap<String, FakeWorkload>,
    networks: Vec<NetworkSummary>,
    failure: Option<RuntimeError>,
    calls: Vec<String>,
}

/// Runtime client that keeps every object in process memory.
#[derive(Debug, Default)]
pub struct InMemoryRuntime {
    state: Mutex<FakeState>,
}

impl InMemoryRuntime {
    /// Creates an empty runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the call and returns the injected failure, if any.
    fn enter(&self, call: String) -> Result<MutexGuard<'_, FakeState>> {
        let mut state = self.lock();
        state.calls.push(call);
        match state.failure.clone() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }

    /// Makes every subsequent call fail with `failure`, or clears it.
    pub fn set_failure(&self, failure: Option<RuntimeError>) {
        self.lock().failure = failure;
    }

    /// Deletes a workload behind the caller's back.
    pub fn remove_out_of_band(&self, id: &RuntimeId) {
        let _ = self.lock().workloads.remove(id.as_str());
    }

    /// Overrides the state of a workload.
    pub fn set_status(&self, id: &RuntimeId, status: WorkloadStatus) {
        if let Some(w) = self.lock().workloads.get_mut(id.as_str()) {
            w.status = status;
        }
    }

    /// Replaces the log output of a workload.
    pub fn set_logs(&self, id: &RuntimeId, logs: impl Into<String>) {
        if let Some(w) = self.lock().workloads.get_mut(id.as_str()) {
            w.logs = logs.into();
        }
    }

    /// Replaces the usage sample of a workload.
    pub fn set_stats(&self, id: &RuntimeId, stats: RawStatsSample) {
        if let Some(w) = self.lock().workloads.get_mut(id.as_str()) {
            w.stats = stats;
        }
    }

    /// Returns a snapshot of a workload.
    #[must_use]
    pub fn workload(&self, id: &RuntimeId) -> Option<FakeWorkload> {
        self.lock().workloads.get(id.as_str()).cloned()
    }

    /// Returns the number of live workloads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().workloads.len()
    }

    /// Returns whether no workloads exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every call made so far, as `op:target`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }
}

fn generate_id() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    let mut out = all[start..].join("\n");
    if !out.is_empty() && text.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[async_trait]
impl RuntimeClient for InMemoryRuntime {
    async fn create(&self, spec: &WorkloadSpec) -> Result<RuntimeHandle> {
        let name = spec.runtime_name();
        let mut state = self.enter(format!("create:{name}"))?;
        if state.workloads.values().any(|w| w.name == name) {
            return Err(RuntimeError::Conflict);
        }
        let id = generate_id();
        let _ = state.workloads.insert(
            id.clone(),
            FakeWorkload {
                name: name.clone(),
                spec: spec.clone(),
                status: WorkloadStatus::Running,
                logs: String::new(),
                stats: RawStatsSample::default(),
            },
        );
        Ok(RuntimeHandle {
            id: RuntimeId::new(id),
            name,
        })
    }

    async fn start(&self, id: &RuntimeId) -> Result<()> {
        let mut state = self.enter(format!("start:{id}"))?;
        let workload = state
            .workloads
            .get_mut(id.as_str())
            .ok_or(RuntimeError::NotFound)?;
        workload.status = WorkloadStatus::Running;
        Ok(())
    }

    async fn stop(&self, id: &RuntimeId) -> Result<()> {
        let mut state = self.enter(format!("stop:{id}"))?;
        if let Some(workload) = state.workloads.get_mut(id.as_str()) {
            workload.status = WorkloadStatus::Exited;
        }
        Ok(())
    }

    async fn restart(&self, id: &RuntimeId) -> Result<()> {
        let mut state = self.enter(format!("restart:{id}"))?;
        let workload = state
            .workloads
            .get_mut(id.as_str())
            .ok_or(RuntimeError::NotFound)?;
        workload.status = WorkloadStatus::Running;
        Ok(())
    }

    async fn remove(&self, id: &RuntimeId) -> Result<()> {
        let mut state = self.enter(format!("remove:{id}"))?;
        let _ = state.workloads.remove(id.as_str());
        Ok(())
    }

    async fn inspect(&self, id: &RuntimeId) -> Result<RawInspection> {
        let state = self.enter(format!("inspect:{id}"))?;
        let workload = state
            .workloads
            .get(id.as_str())
            .ok_or(RuntimeError::NotFound)?;
        let ports = workload
            .spec
            .qualified_ports()
            .into_iter()
            .map(|(port, host)| (port, Some(vec![HostBinding::port(host)])))
            .collect();
        Ok(RawInspection {
            status: workload.status,
            ports,
            networks: vec![workload.spec.network.clone()],
        })
    }

    async fn logs(&self, id: &RuntimeId, tail_lines: usize) -> Result<String> {
        let state = self.enter(format!("logs:{id}"))?;
        let workload = state
            .workloads
            .get(id.as_str())
            .ok_or(RuntimeError::NotFound)?;
        Ok(tail(&workload.logs, tail_lines))
    }

    async fn stats(&self, id: &RuntimeId) -> Result<RawStatsSample> {
        let state = self.enter(format!("stats:{id}"))?;
        state
            .workloads
            .get(id.as_str())
            .map(|w| w.stats)
            .ok_or(RuntimeError::NotFound)
    }

    async fn create_network(&self, name: &str) -> Result<NetworkSummary> {
        let mut state = self.enter(format!("network_create:{name}"))?;
        if state.networks.iter().any(|n| n.name == name) {
            return Err(RuntimeError::Conflict);
        }
        let network = NetworkSummary {
            name: name.to_string(),
            id: generate_id(),
        };
        state.networks.push(network.clone());
        Ok(network)
    }

    async fn list_networks(&self) -> Result<Vec<NetworkSummary>> {
        let state = self.enter("network_list:".to_string())?;
        Ok(state.networks.clone())
    }
}

#[cfg(test)]
mod tests {
    use dockernest_common::types::UserId;

    use super::*;

    fn spec(name: &str, owner: i64) -> WorkloadSpec {
        WorkloadSpec::new(UserId::new(owner), name, "nginx", "dockernest-net")
    }

    #[tokio::test]
    async fn derived_name_collision_is_conflict() {
        let runtime = InMemoryRuntime::new();
        let _ = runtime.create(&spec("web", 1)).await.unwrap();
        assert_eq!(
            runtime.create(&spec("web", 1)).await.unwrap_err(),
            RuntimeError::Conflict
        );
        assert!(runtime.create(&spec("web", 2)).await.is_ok());
    }

    #[tokio::test]
    async fn stop_and_remove_tolerate_absence() {
        let runtime = InMemoryRuntime::new();
        let ghost = RuntimeId::new("ghost");
        assert!(runtime.stop(&ghost).await.is_ok());
        assert!(runtime.remove(&ghost).await.is_ok());
        assert_eq!(runtime.start(&ghost).await.unwrap_err(), RuntimeError::NotFound);
        assert_eq!(runtime.restart(&ghost).await.unwrap_err(), RuntimeError::NotFound);
        assert_eq!(runtime.inspect(&ghost).await.unwrap_err(), RuntimeError::NotFound);
    }

    #[tokio::test]
    async fn logs_are_tailed() {
        let runtime = InMemoryRuntime::new();
        let handle = runtime.create(&spec("web", 1)).await.unwrap();
        runtime.set_logs(&handle.id, "a\nb\nc\n");
        assert_eq!(runtime.logs(&handle.id, 2).await.unwrap(), "b\nc\n");
        assert_eq!(runtime.logs(&handle.id, 50).await.unwrap(), "a\nb\nc\n");
    }

    #[tokio::test]
    async fn injected_failure_applies_to_every_call() {
        let runtime = InMemoryRuntime::new();
        runtime.set_failure(Some(RuntimeError::Unavailable("down".into())));
        assert!(matches!(
            runtime.list_networks().await,
            Err(RuntimeError::Unavailable(_))
        ));
        runtime.set_failure(None);
        assert!(runtime.list_networks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn created_workload_carries_owner_label() {
        let runtime = InMemoryRuntime::new();
        let handle = runtime.create(&spec("db", 5)).await.unwrap();
        let workload = runtime.workload(&handle.id).unwrap();
        assert_eq!(handle.name, "db-5");
        assert_eq!(
            workload.spec.all_labels().get("user_id").map(String::as_str),
            Some("5")
        );
        assert_eq!(handle.id.as_str().len(), 64);
    }
}
