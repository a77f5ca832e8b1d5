//! CLI command definitions and dispatch.

pub mod control;
pub mod create;
pub mod logs;
pub mod network;
pub mod ps;
pub mod rm;
pub mod stats;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use dockernest_common::config::DockernestConfig;
use dockernest_common::constants::BIN_NAME;
use dockernest_common::types::UserId;
use dockernest_core::LifecycleManager;
use dockernest_registry::SqliteRegistry;

/// DockerNest: ownership-scoped container workloads.
#[derive(Parser, Debug)]
#[command(name = BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Numeric id of the user the command acts for.
    #[arg(long, global = true, env = "DOCKERNEST_USER")]
    pub user: Option<i64>,

    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Runtime daemon endpoint. Local defaults when unset.
    #[arg(long, global = true, env = "DOCKER_HOST")]
    pub docker_host: Option<String>,

    /// Upper bound on each runtime call, in seconds.
    #[arg(long, global = true, env = "DOCKERNEST_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Path to the registry database.
    #[arg(long, global = true, env = "DOCKERNEST_DB")]
    pub db: Option<PathBuf>,

    /// Network joined by workloads created without one.
    #[arg(long, global = true, env = "DOCKERNEST_NETWORK")]
    pub default_network: Option<String>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List your workloads with their live state.
    Ps(ps::PsArgs),
    /// Create and start a workload.
    Create(create::CreateArgs),
    /// Stop and remove a workload.
    Rm(rm::RmArgs),
    /// Start a stopped workload.
    Start(control::ControlArgs),
    /// Stop a running workload.
    Stop(control::ControlArgs),
    /// Restart a workload.
    Restart(control::ControlArgs),
    /// Show the tail of a workload's output.
    Logs(logs::LogsArgs),
    /// Show a resource usage sample.
    Stats(stats::StatsArgs),
    /// Manage runtime networks.
    #[command(subcommand)]
    Network(network::NetworkCommand),
}

impl Cli {
    /// Builds the configuration from defaults overlaid with flags.
    pub fn config(&self) -> DockernestConfig {
        let mut config = DockernestConfig::default();
        if let Some(host) = &self.docker_host {
            config.docker_host = Some(host.clone());
        }
        if let Some(secs) = self.timeout {
            config.runtime_timeout_secs = secs;
        }
        if let Some(path) = &self.db {
            config.database_path.clone_from(path);
        }
        if let Some(network) = &self.default_network {
            config.default_network.clone_from(network);
        }
        config
    }
}

/// What every command handler receives.
pub struct Context {
    /// Lifecycle manager wired to the configured registry and runtime.
    pub manager: LifecycleManager,
    /// The acting user.
    pub user: UserId,
    /// Whether to print JSON.
    pub json: bool,
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if no acting user is given, the configuration is
/// invalid, the registry cannot be opened, or the command fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let user = cli
        .user
        .map(UserId::new)
        .context("no acting user: pass --user or set DOCKERNEST_USER")?;
    let config = cli.config();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e.message))?;

    let registry = SqliteRegistry::open(&config.database_path).with_context(|| {
        format!("opening registry at {}", config.database_path.display())
    })?;
    let runtime = dockernest_runtime::backend::connect(&config)
        .context("connecting to the container runtime")?;
    tracing::debug!(user_id = %user, db = %config.database_path.display(), "context ready");

    let ctx = Context {
        manager: LifecycleManager::with_config(Arc::new(registry), runtime, &config),
        user,
        json: cli.json,
    };

    match cli.command {
        Command::Ps(args) => ps::execute(&ctx, args).await,
        Command::Create(args) => create::execute(&ctx, args).await,
        Command::Rm(args) => rm::execute(&ctx, args).await,
        Command::Start(args) => control::execute(&ctx, args, control::Action::Start).await,
        Command::Stop(args) => control::execute(&ctx, args, control::Action::Stop).await,
        Command::Restart(args) => control::execute(&ctx, args, control::Action::Restart).await,
        Command::Logs(args) => logs::execute(&ctx, args).await,
        Command::Stats(args) => stats::execute(&ctx, args).await,
        Command::Network(command) => network::execute(&ctx, command).await,
    }
}
