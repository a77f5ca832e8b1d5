//! `dnest network`: Create and list runtime networks.

use clap::{Args, Subcommand};

use super::Context;
use crate::output;

/// Network subcommands.
#[derive(Subcommand, Debug)]
pub enum NetworkCommand {
    /// Create a network.
    Create(NetworkCreateArgs),
    /// List networks.
    Ls,
}

/// Arguments for `network create`.
#[derive(Args, Debug)]
pub struct NetworkCreateArgs {
    /// Network name.
    pub name: String,
}

/// Executes a network subcommand.
///
/// # Errors
///
/// Returns an error if the runtime refuses the request.
pub async fn execute(ctx: &Context, command: NetworkCommand) -> anyhow::Result<()> {
    match command {
        NetworkCommand::Create(args) => {
            let network = ctx.manager.create_network(ctx.user, &args.name).await?;
            if ctx.json {
                return output::print_json(&network);
            }
            println!("Created network {} [{}]", network.name, short(&network.id));
        }
        NetworkCommand::Ls => {
            let networks = ctx.manager.list_networks(ctx.user).await?;
            if ctx.json {
                return output::print_json(&networks);
            }
            println!("{:<14} {}", "NETWORK ID", "NAME");
            for n in &networks {
                println!("{:<14} {}", short(&n.id), n.name);
            }
        }
    }
    Ok(())
}

fn short(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
