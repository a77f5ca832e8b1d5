//! `dnest create`: Create and start a workload.

use std::collections::BTreeMap;

use anyhow::Context as _;
use clap::Args;
use dockernest_core::CreateRequest;

use super::Context;
use crate::output;

/// Arguments for the `create` command.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Display name, unique among your workloads.
    pub name: String,

    /// Image reference.
    pub image: String,

    /// Command overriding the image default.
    #[arg(long)]
    pub command: Option<String>,

    /// Environment variable as `KEY=VALUE`. Repeatable.
    #[arg(short, long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Port binding as `CONTAINER[/PROTO]:HOST`. Repeatable.
    #[arg(short, long = "publish", value_name = "PORT:HOST")]
    pub publish: Vec<String>,

    /// Network to join instead of the default.
    #[arg(long)]
    pub network: Option<String>,
}

impl CreateArgs {
    fn into_request(self) -> anyhow::Result<CreateRequest> {
        let env = parse_pairs(&self.env, '=').context("invalid --env value")?;
        let ports = parse_pairs(&self.publish, ':').context("invalid --publish value")?;
        Ok(CreateRequest {
            command: self.command,
            env,
            ports,
            network: self.network,
            ..CreateRequest::new(self.name, self.image)
        })
    }
}

/// Splits each item at the first `sep`.
fn parse_pairs(items: &[String], sep: char) -> anyhow::Result<BTreeMap<String, String>> {
    items
        .iter()
        .map(|item| {
            item.split_once(sep)
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .with_context(|| format!("expected `{sep}` in {item:?}"))
        })
        .collect()
}

/// Executes the `create` command.
///
/// # Errors
///
/// Returns an error if an argument is malformed or the workload cannot be
/// created, started, or recorded.
pub async fn execute(ctx: &Context, args: CreateArgs) -> anyhow::Result<()> {
    let request = args.into_request()?;
    let created = ctx.manager.create(ctx.user, request).await?;

    if ctx.json {
        return output::print_json(&created);
    }
    println!(
        "Created {} (id {}) as {} [{}]",
        created.name,
        created.id,
        created.runtime_name,
        created.runtime_id.short()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_split_at_first_separator() {
        let pairs = parse_pairs(&["A=b=c".to_string()], '=').unwrap();
        assert_eq!(pairs.get("A").map(String::as_str), Some("b=c"));
    }

    #[test]
    fn pair_without_separator_is_rejected() {
        assert!(parse_pairs(&["8080".to_string()], ':').is_err());
    }

    #[test]
    fn args_become_request() {
        let args = CreateArgs {
            name: "web".into(),
            image: "nginx".into(),
            command: None,
            env: vec!["MODE=prod".into()],
            publish: vec!["80/tcp:8080".into()],
            network: None,
        };
        let request = args.into_request().unwrap();
        assert_eq!(request.ports.get("80/tcp").map(String::as_str), Some("8080"));
        assert_eq!(request.env.get("MODE").map(String::as_str), Some("prod"));
        assert!(request.network.is_none());
    }
}
