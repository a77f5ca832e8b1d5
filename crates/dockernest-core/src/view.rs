//! Request and result shapes exchanged with lifecycle callers.

use std::collections::BTreeMap;

use dockernest_common::constants::UNKNOWN_NETWORK;
use dockernest_common::error::{LifecycleError, Result};
use dockernest_common::types::{RecordId, RuntimeId, UserId, WorkloadStatus};
use dockernest_registry::WorkloadRecord;
use dockernest_runtime::client::{RawInspection, WorkloadSpec};
use dockernest_runtime::telemetry::{self, PortMap};
use serde::{Deserialize, Deserializer, Serialize};

/// Input of a create operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateRequest {
    /// Display name, unique per owner at the runtime level.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Command line overriding the image default, split on whitespace.
    pub command: Option<String>,
    /// Environment variables. Numeric and boolean values are accepted and
    /// kept in their textual form.
    #[serde(deserialize_with = "stringified_values")]
    pub env: BTreeMap<String, String>,
    /// Bindings from `containerPort[/protocol]` to host port. Host ports may
    /// be given as strings or integers.
    #[serde(deserialize_with = "stringified_values")]
    pub ports: BTreeMap<String, String>,
    /// Network to join. Defaults to the configured network.
    pub network: Option<String>,
}

impl CreateRequest {
    /// Creates a request with only the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Self::default()
        }
    }

    /// Checks the required fields.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` naming the first blank required field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LifecycleError::ValidationFailed { field: "name" });
        }
        if self.image.trim().is_empty() {
            return Err(LifecycleError::ValidationFailed { field: "image" });
        }
        Ok(())
    }

    /// Builds the runtime spec for `owner`.
    pub(crate) fn into_spec(self, owner: UserId, default_network: &str) -> WorkloadSpec {
        let network = self
            .network
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| default_network.to_string());
        let command = self
            .command
            .map(|c| c.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|argv| !argv.is_empty());

        let mut spec = WorkloadSpec::new(owner, self.name, self.image, network);
        spec.command = command;
        spec.env = self.env;
        spec.ports = self.ports;
        spec
    }
}

/// A scalar map value as callers tend to write it.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(text) => text,
            Scalar::Integer(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

fn stringified_values<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Scalar>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.into())).collect())
}

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedWorkload {
    /// Registry-assigned record id.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Runtime handle.
    pub runtime_id: RuntimeId,
    /// Runtime-facing name.
    pub runtime_name: String,
}

/// A workload record joined with its live runtime state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadView {
    /// Registry-assigned record id.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Runtime handle, if recorded.
    pub runtime_id: Option<RuntimeId>,
    /// Observed execution state.
    pub status: WorkloadStatus,
    /// Normalized port bindings.
    pub ports: PortMap,
    /// Attached network.
    pub network: String,
}

impl WorkloadView {
    /// Joins a record with its inspection; `None` yields the degraded view.
    #[must_use]
    pub fn observe(record: &WorkloadRecord, inspection: Option<&RawInspection>) -> Self {
        let (status, ports, network) = inspection.map_or_else(
            || {
                (
                    WorkloadStatus::NotFound,
                    PortMap::new(),
                    UNKNOWN_NETWORK.to_string(),
                )
            },
            |i| {
                (
                    i.status,
                    telemetry::normalize_ports(&i.ports),
                    telemetry::network_name(&i.networks),
                )
            },
        );
        Self {
            id: record.id(),
            name: record.name().to_string(),
            image: record.image().to_string(),
            runtime_id: record.runtime_id().cloned(),
            status,
            ports,
            network,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_fails_before_image() {
        let err = CreateRequest::new(" ", "").validate().unwrap_err();
        assert_eq!(err, LifecycleError::ValidationFailed { field: "name" });
        let err = CreateRequest::new("web", "").validate().unwrap_err();
        assert_eq!(err, LifecycleError::ValidationFailed { field: "image" });
    }

    #[test]
    fn spec_uses_default_network_and_splits_command() {
        let request = CreateRequest {
            command: Some("nginx -g daemon\toff;".into()),
            network: Some(String::new()),
            ..CreateRequest::new("web", "nginx")
        };
        let spec = request.into_spec(UserId::new(3), "dockernest-net");
        assert_eq!(spec.network, "dockernest-net");
        assert_eq!(
            spec.command,
            Some(vec!["nginx".into(), "-g".into(), "daemon".into(), "off;".into()])
        );
        assert_eq!(spec.runtime_name(), "web-3");
    }

    #[test]
    fn empty_command_means_image_default() {
        let request = CreateRequest {
            command: Some("   ".into()),
            network: Some("backend".into()),
            ..CreateRequest::new("web", "nginx")
        };
        let spec = request.into_spec(UserId::new(3), "dockernest-net");
        assert!(spec.command.is_none());
        assert_eq!(spec.network, "backend");
    }

    #[test]
    fn request_deserializes_with_missing_optionals() {
        let request: CreateRequest =
            serde_json::from_str(r#"{"name":"web","image":"nginx","ports":{"80":"8080"}}"#)
                .unwrap();
        assert_eq!(request.ports.get("80").map(String::as_str), Some("8080"));
        assert!(request.command.is_none());
        assert!(request.env.is_empty());
    }

    #[test]
    fn integer_host_ports_and_env_values_are_accepted() {
        let request: CreateRequest = serde_json::from_str(
            r#"{"name":"web","image":"nginx","command":null,"env":{"WORKERS":4,"DEBUG":false},"ports":{"80/tcp":8080,"443":"8443"}}"#,
        )
        .unwrap();
        assert_eq!(request.ports.get("80/tcp").map(String::as_str), Some("8080"));
        assert_eq!(request.ports.get("443").map(String::as_str), Some("8443"));
        assert_eq!(request.env.get("WORKERS").map(String::as_str), Some("4"));
        assert_eq!(request.env.get("DEBUG").map(String::as_str), Some("false"));

        let spec = request.into_spec(UserId::new(1), "dockernest-net");
        assert_eq!(spec.qualified_ports()["80/tcp"], "8080");
    }
}
