//! `dnest ps`: List your workloads with their live state.

use clap::Args;

use super::Context;
use crate::output;

/// Arguments for the `ps` command.
#[derive(Args, Debug)]
pub struct PsArgs {
    /// Show only running workloads.
    #[arg(short, long)]
    pub running: bool,
}

/// Executes the `ps` command.
///
/// Every listed workload is inspected afresh, so the table reflects the
/// runtime at the time of the call.
///
/// # Errors
///
/// Returns an error if the registry or the runtime cannot be read.
pub async fn execute(ctx: &Context, args: PsArgs) -> anyhow::Result<()> {
    let mut views = ctx.manager.list(ctx.user).await?;
    if args.running {
        views.retain(|v| v.status.is_running());
    }

    if ctx.json {
        return output::print_json(&views);
    }
    if views.is_empty() {
        println!("No workloads found.");
        return Ok(());
    }

    println!(
        "{:<6} {:<20} {:<24} {:<14} {:<12} {:<18} {}",
        "ID", "NAME", "IMAGE", "RUNTIME ID", "STATUS", "NETWORK", "PORTS"
    );
    for v in &views {
        println!(
            "{:<6} {:<20} {:<24} {:<14} {:<12} {:<18} {}",
            v.id,
            v.name,
            v.image,
            v.runtime_id.as_ref().map_or("-", |id| id.short()),
            v.status,
            v.network,
            output::format_ports(&v.ports),
        );
    }

    Ok(())
}
