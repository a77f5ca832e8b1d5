//! Normalization of raw runtime telemetry into stable, display-ready shapes.
//!
//! Everything here is pure. The divide-by-zero guards are part of the
//! reported contract: a zero host CPU counter yields `0.0`, and a missing
//! memory limit is treated as one byte. A reported limit of zero is
//! rejected rather than divided by.

use std::collections::BTreeMap;

use dockernest_common::constants::{BYTES_PER_MIB, UNBOUND_HOST_PORT, UNKNOWN_NETWORK};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::{RawPortMap, RawStatsSample};

/// Normalized port map: `containerPort/protocol` to the first host port,
/// `"?"` when a binding entry carries no host port, or `None` when the port
/// is only exposed.
pub type PortMap = BTreeMap<String, Option<String>>;

/// Normalized resource usage of a workload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkloadStats {
    /// CPU usage as a percentage of host CPU time.
    pub cpu_percent: f64,
    /// Memory in use, in MiB.
    pub mem_usage: f64,
    /// Memory limit, in MiB.
    pub mem_limit: f64,
    /// Memory in use as a percentage of the limit.
    pub mem_percent: f64,
}

/// A sample that cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    /// A counter required for normalization was not reported.
    #[error("stats sample is missing {0}")]
    MissingCounter(&'static str),
    /// The sample reports a memory limit of zero bytes.
    #[error("stats sample reports a zero memory limit")]
    ZeroMemoryLimit,
}

/// Reduces raw port bindings to one host port per exposed port.
///
/// Only the first binding of each port is kept. A port with no binding list
/// maps to `None`; an empty list or a binding without a host port maps to
/// the `"?"` marker.
#[must_use]
pub fn normalize_ports(raw: &RawPortMap) -> PortMap {
    raw.iter()
        .map(|(port, bindings)| {
            let host = bindings.as_ref().map(|b| {
                b.first()
                    .and_then(|binding| binding.host_port.clone())
                    .unwrap_or_else(|| UNBOUND_HOST_PORT.to_string())
            });
            (port.clone(), host)
        })
        .collect()
}

/// Returns the first attached network, or `"unknown"` when there is none.
#[must_use]
pub fn network_name(networks: &[String]) -> String {
    networks
        .first()
        .cloned()
        .unwrap_or_else(|| UNKNOWN_NETWORK.to_string())
}

/// Computes `total / system * 100`, or `0.0` when `system <= 0`.
#[must_use]
pub fn cpu_percent(total: f64, system: f64) -> f64 {
    if system <= 0.0 {
        return 0.0;
    }
    total / system * 100.0
}

/// Computes `usage / limit * 100`, treating an absent limit as `1`.
#[must_use]
pub fn memory_percent(usage: f64, limit: Option<f64>) -> f64 {
    usage / limit.unwrap_or(1.0) * 100.0
}

/// Converts bytes to mebibytes.
#[must_use]
pub fn bytes_to_mib(bytes: f64) -> f64 {
    bytes / BYTES_PER_MIB
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalizes a raw usage sample into percentages and MiB.
///
/// # Errors
///
/// Returns an error if the sample carries no memory usage counter or
/// reports a zero memory limit.
#[allow(clippy::cast_precision_loss)]
pub fn normalize_stats(sample: &RawStatsSample) -> Result<WorkloadStats, TelemetryError> {
    let usage = sample
        .memory_usage
        .ok_or(TelemetryError::MissingCounter("memory usage"))? as f64;
    if sample.memory_limit == Some(0) {
        return Err(TelemetryError::ZeroMemoryLimit);
    }
    let limit = sample.memory_limit.map(|l| l as f64);
    let cpu = cpu_percent(
        sample.cpu_total_usage as f64,
        sample.system_cpu_usage.unwrap_or(0) as f64,
    );

    Ok(WorkloadStats {
        cpu_percent: round2(cpu),
        mem_usage: round2(bytes_to_mib(usage)),
        mem_limit: round2(bytes_to_mib(limit.unwrap_or(1.0))),
        mem_percent: round2(memory_percent(usage, limit)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HostBinding;

    #[test]
    fn first_binding_wins() {
        let mut raw = RawPortMap::new();
        let _ = raw.insert(
            "80/tcp".into(),
            Some(vec![HostBinding::port("8080"), HostBinding::port("8081")]),
        );
        let ports = normalize_ports(&raw);
        assert_eq!(ports.len(), 1);
        assert_eq!(ports["80/tcp"].as_deref(), Some("8080"));
    }

    #[test]
    fn exposed_and_empty_ports_are_distinguished() {
        let mut raw = RawPortMap::new();
        let _ = raw.insert("443/tcp".into(), None);
        let _ = raw.insert("53/udp".into(), Some(Vec::new()));
        let ports = normalize_ports(&raw);
        assert_eq!(ports.get("443/tcp"), Some(&None));
        assert_eq!(ports["53/udp"].as_deref(), Some("?"));
    }

    #[test]
    fn binding_without_host_port_uses_marker() {
        let mut raw = RawPortMap::new();
        let _ = raw.insert("80/tcp".into(), Some(vec![HostBinding::default()]));
        assert_eq!(normalize_ports(&raw)["80/tcp"].as_deref(), Some("?"));
    }

    #[test]
    fn network_name_falls_back_to_unknown() {
        assert_eq!(network_name(&[]), "unknown");
        assert_eq!(
            network_name(&["bridge".to_string(), "dockernest-net".to_string()]),
            "bridge"
        );
    }

    #[test]
    fn cpu_percent_is_zero_without_system_time() {
        assert!(cpu_percent(123_456.0, 0.0).abs() < f64::EPSILON);
        assert!(cpu_percent(123_456.0, -5.0).abs() < f64::EPSILON);
        assert!((cpu_percent(25.0, 100.0) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_memory_limit_defaults_to_one_byte() {
        let sample = RawStatsSample {
            cpu_total_usage: 0,
            system_cpu_usage: None,
            memory_usage: Some(104_857_600),
            memory_limit: None,
        };
        let stats = normalize_stats(&sample).unwrap();
        assert!((stats.mem_percent - 10_485_760_000.0).abs() < f64::EPSILON);
        assert!(stats.mem_limit.abs() < f64::EPSILON);
        assert!((stats.mem_usage - 100.0).abs() < f64::EPSILON);
        assert!(stats.cpu_percent.abs() < f64::EPSILON);
    }

    #[test]
    fn stats_are_rounded_to_two_decimals() {
        let sample = RawStatsSample {
            cpu_total_usage: 1,
            system_cpu_usage: Some(3),
            memory_usage: Some(1_000_000),
            memory_limit: Some(3_000_000),
        };
        let stats = normalize_stats(&sample).unwrap();
        assert!((stats.cpu_percent - 33.33).abs() < 1e-9);
        assert!((stats.mem_percent - 33.33).abs() < 1e-9);
        assert!((stats.mem_usage - 0.95).abs() < 1e-9);
        assert!((stats.mem_limit - 2.86).abs() < 1e-9);
    }

    #[test]
    fn missing_memory_usage_is_an_error() {
        let err = normalize_stats(&RawStatsSample::default()).unwrap_err();
        assert_eq!(err, TelemetryError::MissingCounter("memory usage"));
    }

    #[test]
    fn zero_memory_limit_is_an_error() {
        let sample = RawStatsSample {
            cpu_total_usage: 10,
            system_cpu_usage: Some(100),
            memory_usage: Some(4096),
            memory_limit: Some(0),
        };
        assert_eq!(
            normalize_stats(&sample).unwrap_err(),
            TelemetryError::ZeroMemoryLimit
        );
    }
}
