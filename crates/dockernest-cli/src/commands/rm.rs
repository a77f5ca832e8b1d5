//! `dnest rm`: Stop and remove a workload.

use clap::Args;
use dockernest_common::types::RecordId;

use super::Context;

/// Arguments for the `rm` command.
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Record ids to remove.
    #[arg(required = true)]
    pub ids: Vec<i64>,
}

/// Executes the `rm` command.
///
/// Ids are removed in order; the first failure aborts the rest.
///
/// # Errors
///
/// Returns an error if any workload cannot be removed.
pub async fn execute(ctx: &Context, args: RmArgs) -> anyhow::Result<()> {
    for id in args.ids.into_iter().map(RecordId::new) {
        ctx.manager.delete(ctx.user, id).await?;
        if !ctx.json {
            println!("Removed {id}");
        }
    }
    Ok(())
}
