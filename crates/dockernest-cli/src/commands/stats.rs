//! `dnest stats`: Show a resource usage sample.

use clap::Args;
use dockernest_common::types::RecordId;

use super::Context;
use crate::output;

/// Arguments for the `stats` command.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Record id of the workload.
    pub id: i64,
}

/// Executes the `stats` command.
///
/// # Errors
///
/// Returns an error if the workload is not yours or no usable sample is
/// available.
pub async fn execute(ctx: &Context, args: StatsArgs) -> anyhow::Result<()> {
    let stats = ctx.manager.stats(ctx.user, RecordId::new(args.id)).await?;

    if ctx.json {
        return output::print_json(&stats);
    }
    let memory = format!(
        "{} / {}",
        output::format_mib(stats.mem_usage),
        output::format_mib(stats.mem_limit)
    );
    println!("{:<10} {:<24} {:<10}", "CPU %", "MEM USAGE / LIMIT", "MEM %");
    println!(
        "{:<10} {memory:<24} {:<10}",
        output::format_percent(stats.cpu_percent),
        output::format_percent(stats.mem_percent),
    );
    Ok(())
}
