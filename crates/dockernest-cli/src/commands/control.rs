//! `dnest start|stop|restart`: Change a workload's execution state.

use std::fmt;

use clap::Args;
use dockernest_common::types::RecordId;

use super::Context;

/// Arguments shared by `start`, `stop`, and `restart`.
#[derive(Args, Debug)]
pub struct ControlArgs {
    /// Record id of the workload.
    pub id: i64,
}

/// State change requested by the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Start a stopped workload.
    Start,
    /// Stop a running workload.
    Stop,
    /// Restart a workload.
    Restart,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Started"),
            Self::Stop => write!(f, "Stopped"),
            Self::Restart => write!(f, "Restarted"),
        }
    }
}

/// Executes a state change.
///
/// # Errors
///
/// Returns an error if the workload is not yours or the runtime refuses.
pub async fn execute(ctx: &Context, args: ControlArgs, action: Action) -> anyhow::Result<()> {
    let id = RecordId::new(args.id);
    match action {
        Action::Start => ctx.manager.start(ctx.user, id).await?,
        Action::Stop => ctx.manager.stop(ctx.user, id).await?,
        Action::Restart => ctx.manager.restart(ctx.user, id).await?,
    }
    if !ctx.json {
        println!("{action} {id}");
    }
    Ok(())
}
