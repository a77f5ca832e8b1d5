//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Default base directory for DockerNest data when no home directory is usable.
pub const SYSTEM_DATA_DIR: &str = "/var/lib/dockernest";

/// Returns the data directory, preferring `$HOME/.dockernest` and falling
/// back to `/var/lib/dockernest`.
fn resolve_data_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        let user_dir = PathBuf::from(home).join(".dockernest");
        if std::fs::create_dir_all(&user_dir).is_ok() {
            return user_dir;
        }
    }
    PathBuf::from(SYSTEM_DATA_DIR)
}

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved data directory for this session.
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(resolve_data_dir)
}

/// Returns the default registry database path.
pub fn default_database_path() -> PathBuf {
    data_dir().join(DATABASE_FILE)
}

/// File name of the registry database inside the data directory.
pub const DATABASE_FILE: &str = "dockernest.db";

/// Network new workloads join when the request names none.
pub const DEFAULT_NETWORK: &str = "dockernest-net";

/// Network name reported when a workload is attached to no network.
pub const UNKNOWN_NETWORK: &str = "unknown";

/// Host port reported for a binding that carries no host port.
pub const UNBOUND_HOST_PORT: &str = "?";

/// Label key carrying the owning user's identifier on every runtime object.
pub const OWNER_LABEL: &str = "user_id";

/// Number of log lines returned by a log fetch.
pub const DEFAULT_LOG_TAIL_LINES: usize = 50;

/// Upper bound on a single runtime call, in seconds.
pub const DEFAULT_RUNTIME_TIMEOUT_SECS: u64 = 30;

/// Grace period the runtime gives a workload to exit on stop, in seconds.
pub const STOP_GRACE_SECS: i64 = 10;

/// Bytes per mebibyte.
pub const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Binary name for the CLI.
pub const BIN_NAME: &str = "dnest";
