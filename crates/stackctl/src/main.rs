use anyhow::Result;
use clap::{Parser, Subcommand};
use provision::{InvocationContext, RestartRequested};
use std::path::PathBuf;

mod commands;
mod exec;

#[derive(Parser)]
#[command(name = "stackctl")]
#[command(about = "Stackctl - self-updating stack provisioning tool")]
#[command(version)]
struct Cli {
    /// Skip the self-update check
    #[arg(long, global = true)]
    no_self_update: bool,

    /// Remote reference the self-update pulls from
    #[arg(long, global = true, default_value = "main")]
    source_ref: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the container engine if needed and (re)start the stack
    Deploy {
        /// Directory holding the stack definition and data
        #[arg(long, default_value = "/opt/stack")]
        stack_dir: PathBuf,
    },

    /// Prepare a container's isolation policy for nested containers
    Prepare {
        /// Numeric container identifier (prompted for when omitted)
        ctid: Option<String>,

        /// Directory holding per-container policy documents
        #[arg(long, default_value = "/etc/pve/lxc")]
        policy_dir: PathBuf,
    },

    /// Show running services and endpoints without touching anything
    Status {
        /// Directory holding the stack definition
        #[arg(long, default_value = "/opt/stack")]
        stack_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let ctx = InvocationContext::capture()?;

    let restart: Option<RestartRequested> = smol::block_on(async {
        match &cli.command {
            Commands::Deploy { stack_dir } => {
                commands::deploy::run(ctx, stack_dir, self_update(&cli)).await
            }
            Commands::Prepare { ctid, policy_dir } => {
                commands::prepare::run(ctx, ctid.clone(), policy_dir, self_update(&cli)).await
            }
            Commands::Status { stack_dir } => commands::status::run(stack_dir).await.map(|()| None),
        }
    })?;

    // The only place a process replacement ever happens.
    if let Some(restart) = restart {
        return Err(exec::replace_process(restart));
    }

    Ok(())
}

/// Whether and from where this invocation self-updates
fn self_update(cli: &Cli) -> Option<String> {
    if cli.no_self_update {
        None
    } else {
        Some(cli.source_ref.clone())
    }
}
