//! Runtime client adapter and telemetry normalization for DockerNest.
//!
//! The [`RuntimeClient`](client::RuntimeClient) trait is the only seam
//! through which the rest of the workspace reaches the container runtime.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod backend;
pub mod client;
pub mod error;
pub mod telemetry;
