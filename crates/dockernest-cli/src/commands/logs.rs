//! `dnest logs`: Show the tail of a workload's output.

use clap::Args;
use dockernest_common::types::RecordId;

use super::Context;
use crate::output;

/// Arguments for the `logs` command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Record id of the workload.
    pub id: i64,
}

/// Executes the `logs` command.
///
/// # Errors
///
/// Returns an error if the workload is not yours or its logs cannot be read.
pub async fn execute(ctx: &Context, args: LogsArgs) -> anyhow::Result<()> {
    let logs = ctx.manager.logs(ctx.user, RecordId::new(args.id)).await?;

    if ctx.json {
        return output::print_json(&serde_json::json!({ "logs": logs }));
    }
    if logs.is_empty() {
        println!("No logs available for workload {}", args.id);
    } else {
        print!("{logs}");
    }
    Ok(())
}
