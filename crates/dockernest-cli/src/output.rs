//! Formatted output helpers for CLI commands.

use std::fmt::Write as _;

use dockernest_core::PortMap;
use serde::Serialize;

/// Prints `value` as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Formats a port map as `80/tcp->8080, 443/tcp`.
///
/// Exposed ports without a binding are printed bare.
#[must_use]
pub fn format_ports(ports: &PortMap) -> String {
    let mut out = String::new();
    for (port, host) in ports {
        if !out.is_empty() {
            out.push_str(", ");
        }
        match host {
            Some(host) => {
                let _ = write!(out, "{port}->{host}");
            }
            None => out.push_str(port),
        }
    }
    if out.is_empty() {
        out.push('-');
    }
    out
}

/// Formats a MiB amount (e.g., "12.50 MiB").
#[must_use]
pub fn format_mib(mib: f64) -> String {
    format!("{mib:.2} MiB")
}

/// Formats a percentage (e.g., "3.25%").
#[must_use]
pub fn format_percent(pct: f64) -> String {
    format!("{pct:.2}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_ports_lists_bindings_in_order() {
        let mut ports = PortMap::new();
        let _ = ports.insert("443/tcp".into(), None);
        let _ = ports.insert("80/tcp".into(), Some("8080".into()));
        assert_eq!(format_ports(&ports), "443/tcp, 80/tcp->8080");
    }

    #[test]
    fn format_ports_shows_dash_when_empty() {
        assert_eq!(format_ports(&PortMap::new()), "-");
    }

    #[test]
    fn format_ports_keeps_unknown_host_marker() {
        let mut ports = PortMap::new();
        let _ = ports.insert("53/udp".into(), Some("?".into()));
        assert_eq!(format_ports(&ports), "53/udp->?");
    }

    #[test]
    fn format_mib_uses_two_decimals() {
        assert_eq!(format_mib(10.0), "10.00 MiB");
        assert_eq!(format_mib(0.004), "0.00 MiB");
    }

    #[test]
    fn format_percent_uses_two_decimals() {
        assert_eq!(format_percent(25.0), "25.00%");
    }
}
