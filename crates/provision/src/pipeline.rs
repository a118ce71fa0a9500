//! Top-level stage sequencing
//!
//! Each pipeline runs its stages strictly in order and fail-fast; an
//! earlier stage failing aborts the run with no compensation (the
//! whole pipeline is idempotent and meant to be rerun). Process
//! replacement requests from the privilege gate or the self-update
//! agent short-circuit the remaining stages and bubble up to the
//! binary, which execs exactly once.

use crate::context::InvocationContext;
use crate::engine::PackageInstaller;
use crate::lifecycle::StackLifecycle;
use crate::policy::{PolicyEditor, PolicyOutcome};
use crate::privilege::{ensure_privileged, Gate, RestartRequested};
use crate::probe::Probes;
use crate::prompt::Prompter;
use crate::selfupdate::{SelfUpdate, SelfUpdateOutcome};
use crate::{Error, Result};
use command_runner::{Command, Runner};
use tracing::{info, warn};

/// Outcome of the deploy pipeline
#[derive(Debug)]
pub enum PipelineOutcome {
    /// All stages ran to completion in this process
    Completed,
    /// The process must be replaced; no further stages ran
    Restart(RestartRequested),
}

/// Outcome of the prepare (host-side) pipeline
#[derive(Debug)]
pub enum PrepareOutcome {
    /// The process must be replaced; no further stages ran
    Restart(RestartRequested),
    /// The policy editor ran to completion
    Policy(PolicyOutcome),
}

/// Guest-side pipeline: engine setup and stack convergence
pub struct DeployPipeline {
    ctx: InvocationContext,
    update: Option<SelfUpdate>,
    probes: Probes,
    installer: Box<dyn PackageInstaller>,
    lifecycle: StackLifecycle,
    runner: Box<dyn Runner>,
}

impl DeployPipeline {
    /// Assemble the pipeline from its stage components
    pub fn new(
        ctx: InvocationContext,
        update: Option<SelfUpdate>,
        probes: Probes,
        installer: Box<dyn PackageInstaller>,
        lifecycle: StackLifecycle,
        runner: Box<dyn Runner>,
    ) -> Self {
        Self {
            ctx,
            update,
            probes,
            installer,
            lifecycle,
            runner,
        }
    }

    /// Run all stages in order
    pub async fn run(&self) -> Result<PipelineOutcome> {
        if let Gate::Restart(restart) = ensure_privileged(&self.ctx)? {
            return Ok(PipelineOutcome::Restart(restart));
        }

        if let Some(update) = &self.update {
            match update.run(&self.ctx).await? {
                SelfUpdateOutcome::Restart(restart) => {
                    return Ok(PipelineOutcome::Restart(restart));
                }
                SelfUpdateOutcome::Unchanged | SelfUpdateOutcome::FetchFailed => {}
            }
        }

        if !self.probes.engine_installed().await? {
            info!("container engine not found, installing");
            self.installer.install_engine().await?;
        }

        if !self.probes.compose_available().await? {
            return Err(Error::MissingTool("docker compose plugin".to_string()));
        }

        if let Some(user) = self.ctx.delegate_user() {
            if !self.probes.user_in_docker_group(user).await? {
                self.add_to_docker_group(user).await?;
            }
        }

        self.lifecycle.converge().await?;
        Ok(PipelineOutcome::Completed)
    }

    /// Grant the delegate user engine access for later unprivileged runs
    async fn add_to_docker_group(&self, user: &str) -> Result<()> {
        warn!(user, "adding user to the docker group");
        let mut cmd = Command::new("usermod");
        cmd.args(["-aG", "docker", user]);
        let line = cmd.display();
        let output = self.runner.run(cmd).await?;
        if !output.success() {
            return Err(Error::command_failed(line, &output));
        }
        Ok(())
    }
}

/// Host-side pipeline: isolation policy preparation
pub struct PreparePipeline {
    ctx: InvocationContext,
    update: Option<SelfUpdate>,
    editor: PolicyEditor,
}

impl PreparePipeline {
    /// Assemble the pipeline from its stage components
    pub fn new(ctx: InvocationContext, update: Option<SelfUpdate>, editor: PolicyEditor) -> Self {
        Self { ctx, update, editor }
    }

    /// Run all stages in order
    ///
    /// `container_id` comes from the command line when given; otherwise
    /// the operator is prompted for it.
    pub async fn run(
        &self,
        container_id: Option<String>,
        prompter: &mut dyn Prompter,
    ) -> Result<PrepareOutcome> {
        if let Gate::Restart(restart) = ensure_privileged(&self.ctx)? {
            return Ok(PrepareOutcome::Restart(restart));
        }

        if let Some(update) = &self.update {
            match update.run(&self.ctx).await? {
                SelfUpdateOutcome::Restart(restart) => {
                    return Ok(PrepareOutcome::Restart(restart));
                }
                SelfUpdateOutcome::Unchanged | SelfUpdateOutcome::FetchFailed => {}
            }
        }

        let ctid = match container_id {
            Some(id) => id,
            None => prompter.read_line("Container ID to prepare")?,
        };

        let outcome = self.editor.apply(&ctid, prompter).await?;
        Ok(PrepareOutcome::Policy(outcome))
    }
}
