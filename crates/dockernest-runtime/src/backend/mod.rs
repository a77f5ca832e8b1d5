//! Runtime client implementations.
//!
//! [`DockerRuntime`] is the production adapter. [`InMemoryRuntime`] is a
//! test double that behaves like a daemon without needing one.

pub mod docker;
pub mod memory;

use std::sync::Arc;

use dockernest_common::config::DockernestConfig;

pub use self::docker::DockerRuntime;
pub use self::memory::InMemoryRuntime;
use crate::client::RuntimeClient;
use crate::error::Result;

/// Connects the production runtime client described by `config`.
///
/// # Errors
///
/// Returns `Unavailable` if the daemon endpoint cannot be configured.
pub fn connect(config: &DockernestConfig) -> Result<Arc<dyn RuntimeClient>> {
    Ok(Arc::new(DockerRuntime::connect(config)?))
}
