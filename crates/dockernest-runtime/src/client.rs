//! The runtime client capability set and the payloads it exchanges.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dockernest_common::constants::OWNER_LABEL;
use dockernest_common::types::{RuntimeId, UserId, WorkloadStatus};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Raw port bindings keyed by `containerPort/protocol`.
///
/// `None` and an empty list both mean the port is exposed but unbound.
pub type RawPortMap = BTreeMap<String, Option<Vec<HostBinding>>>;

/// Request to run a new workload on behalf of an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    /// Owning user, recorded as a label on the runtime object.
    pub owner: UserId,
    /// User-chosen display name.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Command overriding the image default.
    pub command: Option<Vec<String>>,
    /// Environment variables.
    pub env: BTreeMap<String, String>,
    /// Requested bindings from `containerPort[/protocol]` to host port.
    pub ports: BTreeMap<String, String>,
    /// Network to attach the workload to.
    pub network: String,
    /// Extra labels. The owner label always overrides a same-named entry.
    pub labels: BTreeMap<String, String>,
}

impl WorkloadSpec {
    /// Creates a spec with no command, environment, ports, or extra labels.
    #[must_use]
    pub fn new(
        owner: UserId,
        name: impl Into<String>,
        image: impl Into<String>,
        network: impl Into<String>,
    ) -> Self {
        Self {
            owner,
            name: name.into(),
            image: image.into(),
            command: None,
            env: BTreeMap::new(),
            ports: BTreeMap::new(),
            network: network.into(),
            labels: BTreeMap::new(),
        }
    }

    /// Returns the runtime-facing name, unique per owner.
    #[must_use]
    pub fn runtime_name(&self) -> String {
        runtime_name(&self.name, self.owner)
    }

    /// Returns every label to attach, including the owner label.
    #[must_use]
    pub fn all_labels(&self) -> BTreeMap<String, String> {
        let mut labels = self.labels.clone();
        let _ = labels.insert(OWNER_LABEL.to_string(), self.owner.to_string());
        labels
    }

    /// Returns the requested port bindings with every key qualified by a
    /// protocol, defaulting to tcp.
    #[must_use]
    pub fn qualified_ports(&self) -> BTreeMap<String, String> {
        self.ports
            .iter()
            .map(|(port, host)| {
                let key = if port.contains('/') {
                    port.clone()
                } else {
                    format!("{port}/tcp")
                };
                (key, host.clone())
            })
            .collect()
    }
}

/// Derives the runtime-facing name for a workload.
#[must_use]
pub fn runtime_name(name: &str, owner: UserId) -> String {
    format!("{name}-{owner}")
}

/// Handle to a runtime object returned by creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeHandle {
    /// Runtime-assigned identifier.
    pub id: RuntimeId,
    /// Runtime-facing name.
    pub name: String,
}

/// One host binding of an exposed port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostBinding {
    /// Host interface address.
    pub host_ip: Option<String>,
    /// Host port, as reported by the runtime.
    pub host_port: Option<String>,
}

impl HostBinding {
    /// Creates a binding on all interfaces for the given host port.
    #[must_use]
    pub fn port(host_port: impl Into<String>) -> Self {
        Self {
            host_ip: None,
            host_port: Some(host_port.into()),
        }
    }
}

/// Inspection result for a live runtime object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInspection {
    /// Current execution state.
    pub status: WorkloadStatus,
    /// Port bindings as reported by the runtime.
    pub ports: RawPortMap,
    /// Names of attached networks, sorted.
    pub networks: Vec<String>,
}

/// A single point-in-time resource usage sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatsSample {
    /// Cumulative CPU time consumed by the workload.
    pub cpu_total_usage: u64,
    /// Cumulative CPU time of the host, if reported.
    pub system_cpu_usage: Option<u64>,
    /// Memory in use, in bytes.
    pub memory_usage: Option<u64>,
    /// Memory limit, in bytes.
    pub memory_limit: Option<u64>,
}

/// A network known to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSummary {
    /// Network name.
    pub name: String,
    /// Runtime-assigned network identifier.
    pub id: String,
}

/// Capability set of the container runtime.
///
/// Every call is a single bounded attempt. Implementations enforce their own
/// deadline and report expiry as
/// [`RuntimeError::Unavailable`](crate::error::RuntimeError::Unavailable).
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Creates and starts a workload.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the derived runtime name is taken.
    async fn create(&self, spec: &WorkloadSpec) -> Result<RuntimeHandle>;

    /// Starts a stopped workload.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the workload does not exist.
    async fn start(&self, id: &RuntimeId) -> Result<()>;

    /// Stops a workload. Succeeds if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon fails the request.
    async fn stop(&self, id: &RuntimeId) -> Result<()>;

    /// Restarts a workload.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the workload does not exist.
    async fn restart(&self, id: &RuntimeId) -> Result<()>;

    /// Removes a workload. Succeeds if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon fails the request.
    async fn remove(&self, id: &RuntimeId) -> Result<()>;

    /// Inspects a workload.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the workload does not exist.
    async fn inspect(&self, id: &RuntimeId) -> Result<RawInspection>;

    /// Returns the last `tail_lines` lines of combined output.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the workload does not exist.
    async fn logs(&self, id: &RuntimeId, tail_lines: usize) -> Result<String>;

    /// Takes a single non-streaming usage sample.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the workload does not exist.
    async fn stats(&self, id: &RuntimeId) -> Result<RawStatsSample>;

    /// Creates a network.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the name is taken.
    async fn create_network(&self, name: &str) -> Result<NetworkSummary>;

    /// Lists networks.
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon fails the request.
    async fn list_networks(&self) -> Result<Vec<NetworkSummary>>;
}
