//! The deploy subcommand: converge the stack on this host

use crate::commands::repo_dir;
use crate::commands::status::render_report;
use anyhow::{Context, Result};
use command_runner::backends::{AsUserRunner, LocalRunner};
use command_runner::Runner;
use provision::{
    AptInstaller, ComposeRuntime, DeployPipeline, GitSync, InvocationContext, PipelineOutcome,
    Probes, RestartRequested, SelfUpdate, StackLifecycle, StatusReporter,
};
use std::path::Path;

pub async fn run(
    ctx: InvocationContext,
    stack_dir: &Path,
    source_ref: Option<String>,
) -> Result<Option<RestartRequested>> {
    let compose_file = stack_dir.join("docker-compose.yml");
    let data_dir = stack_dir.join("data");
    let delegate_user = ctx.delegate_user().map(String::from);

    let update = source_ref.map(|source_ref| {
        SelfUpdate::new(
            Box::new(GitSync::new(repo_dir(&ctx), Box::new(LocalRunner))),
            source_ref,
        )
    });

    // Engine commands go through the delegate user when this run was
    // escalated on their behalf, so containers and volumes end up
    // owned by them instead of root.
    let engine_runner: Box<dyn Runner> = match &delegate_user {
        Some(user) => Box::new(AsUserRunner::new(user.clone(), LocalRunner)),
        None => Box::new(LocalRunner),
    };
    let runtime = ComposeRuntime::new(compose_file.clone(), engine_runner);
    let lifecycle = StackLifecycle::new(
        Box::new(runtime),
        Box::new(LocalRunner),
        data_dir,
        delegate_user,
    );

    let pipeline = DeployPipeline::new(
        ctx,
        update,
        Probes::new(Box::new(LocalRunner)),
        Box::new(AptInstaller::new(Box::new(LocalRunner))),
        lifecycle,
        Box::new(LocalRunner),
    );

    match pipeline.run().await.context("deploy failed")? {
        PipelineOutcome::Restart(restart) => Ok(Some(restart)),
        PipelineOutcome::Completed => {
            println!("✓ stack deployed");

            // Advisory only; never fails the run.
            let reporter = StatusReporter::new(Box::new(LocalRunner));
            let runtime = ComposeRuntime::new(compose_file, Box::new(LocalRunner));
            let report = reporter.gather(&runtime).await;
            render_report(&report);

            Ok(None)
        }
    }
}

