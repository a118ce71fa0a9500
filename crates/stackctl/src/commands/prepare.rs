//! The prepare subcommand: ready a container for nested containers

use crate::commands::repo_dir;
use anyhow::{Context, Result};
use command_runner::backends::LocalRunner;
use provision::{
    GitSync, InvocationContext, PctContainerCtl, PolicyEditor, PolicyOutcome, PrepareOutcome,
    PreparePipeline, RestartRequested, SelfUpdate, TerminalPrompter,
};
use std::path::Path;

pub async fn run(
    ctx: InvocationContext,
    ctid: Option<String>,
    policy_dir: &Path,
    source_ref: Option<String>,
) -> Result<Option<RestartRequested>> {
    let update = source_ref.map(|source_ref| {
        SelfUpdate::new(
            Box::new(GitSync::new(repo_dir(&ctx), Box::new(LocalRunner))),
            source_ref,
        )
    });

    let editor = PolicyEditor::new(
        Box::new(PctContainerCtl::new(Box::new(LocalRunner))),
        policy_dir.to_path_buf(),
    );
    let pipeline = PreparePipeline::new(ctx, update, editor);

    let mut prompter = TerminalPrompter;
    match pipeline
        .run(ctid, &mut prompter)
        .await
        .context("prepare failed")?
    {
        PrepareOutcome::Restart(restart) => Ok(Some(restart)),
        PrepareOutcome::Policy(outcome) => {
            match outcome {
                PolicyOutcome::Applied { backup } => {
                    println!("✓ nesting directives applied (backup: {})", backup.display());
                }
                PolicyOutcome::Reapplied { backup } => {
                    println!("✓ nesting directives reapplied (backup: {})", backup.display());
                }
                PolicyOutcome::SkippedAlreadyApplied => {
                    println!("✓ container already configured, nothing changed");
                }
            }
            Ok(None)
        }
    }
}
