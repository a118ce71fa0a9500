//! Stack lifecycle driver
//!
//! Sequences teardown, image refresh, and startup of the declared
//! service stack. The stack definition itself is opaque: only the
//! lifecycle verbs are issued against it, through the [`StackRuntime`]
//! capability. No step is retried; any unexpected failure aborts and
//! the operator reruns the idempotent pipeline.

use crate::{Error, Result};
use async_trait::async_trait;
use command_runner::{Command, Runner};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// A running service as reported by the stack runtime
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StackService {
    /// Service name from the stack declaration
    #[serde(rename = "Service")]
    pub service: String,
    /// Coarse state (running, exited, ...)
    #[serde(rename = "State")]
    pub state: String,
    /// Human-readable status line
    #[serde(rename = "Status", default)]
    pub status: String,
}

/// Lifecycle verbs over an opaque stack definition
#[async_trait]
pub trait StackRuntime {
    /// Whether any service of the stack is currently running
    ///
    /// Inspects live process state, never a stored flag: it must
    /// reflect reality even after a crashed previous run.
    async fn is_running(&self) -> Result<bool>;
    /// Tear the stack down
    async fn down(&self) -> Result<()>;
    /// Refresh the stack's images
    async fn pull(&self) -> Result<()>;
    /// Bring the stack up detached
    async fn up(&self) -> Result<()>;
    /// List the stack's services and their states
    async fn services(&self) -> Result<Vec<StackService>>;
}

/// Compose-CLI-backed stack runtime
///
/// Every verb shells out to `docker compose -f <file> ...` through the
/// runner it was built with; handing it a delegation runner makes all
/// resulting artifacts owned by the delegate user.
pub struct ComposeRuntime {
    compose_file: PathBuf,
    runner: Box<dyn Runner>,
}

impl ComposeRuntime {
    /// Create a runtime for the given compose file
    pub fn new(compose_file: PathBuf, runner: Box<dyn Runner>) -> Self {
        Self {
            compose_file,
            runner,
        }
    }

    fn compose(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("docker");
        cmd.arg("compose").arg("-f").arg(&self.compose_file).args(args);
        cmd
    }

    async fn verb(&self, args: &[&str]) -> Result<()> {
        let cmd = self.compose(args);
        let line = cmd.display();
        let status = self.runner.run_interactive(cmd).await?;
        if !status.success() {
            return Err(Error::CommandFailed {
                command: line,
                code: status.code,
                detail: "see engine output above".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StackRuntime for ComposeRuntime {
    async fn is_running(&self) -> Result<bool> {
        let output = self.runner.run(self.compose(&["ps", "-q"])).await?;
        Ok(output.success() && !output.stdout_trimmed().is_empty())
    }

    async fn down(&self) -> Result<()> {
        self.verb(&["down"]).await
    }

    async fn pull(&self) -> Result<()> {
        self.verb(&["pull"]).await
    }

    async fn up(&self) -> Result<()> {
        self.verb(&["up", "-d"]).await
    }

    async fn services(&self) -> Result<Vec<StackService>> {
        let cmd = self.compose(&["ps", "--format", "json"]);
        let line = cmd.display();
        let output = self.runner.run(cmd).await?;
        if !output.success() {
            return Err(Error::command_failed(line, &output));
        }

        // One JSON object per line; tolerate blank lines.
        let mut services = Vec::new();
        for entry in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            let service: StackService = serde_json::from_str(entry).map_err(|e| {
                Error::CommandFailed {
                    command: line.clone(),
                    code: output.status.code,
                    detail: format!("unparseable service entry: {e}"),
                }
            })?;
            services.push(service);
        }
        Ok(services)
    }
}

/// Fixed post-startup grace period before status is reported
const STARTUP_GRACE: Duration = Duration::from_secs(10);

/// Drives the stop → pull → start → settle sequence
pub struct StackLifecycle {
    runtime: Box<dyn StackRuntime>,
    runner: Box<dyn Runner>,
    data_dir: PathBuf,
    delegate_user: Option<String>,
    startup_grace: Duration,
}

impl StackLifecycle {
    /// Create a driver for the given runtime
    ///
    /// `runner` executes the privileged follow-up work (ownership
    /// fixups) and must run as the escalated identity; `delegate_user`
    /// is the non-privileged owner of the stack's data when the run
    /// was escalated on their behalf.
    pub fn new(
        runtime: Box<dyn StackRuntime>,
        runner: Box<dyn Runner>,
        data_dir: PathBuf,
        delegate_user: Option<String>,
    ) -> Self {
        Self {
            runtime,
            runner,
            data_dir,
            delegate_user,
            startup_grace: STARTUP_GRACE,
        }
    }

    /// Override the post-startup grace period (tests)
    pub fn with_startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    /// Run the full lifecycle sequence once
    pub async fn converge(&self) -> Result<()> {
        if self.runtime.is_running().await? {
            info!("stack is running, stopping it first");
            self.runtime.down().await?;
        } else {
            debug!("stack not running, skipping teardown");
        }

        std::fs::create_dir_all(&self.data_dir)?;

        info!("pulling stack images");
        self.runtime.pull().await?;

        info!("starting stack");
        self.runtime.up().await?;

        if let Some(user) = &self.delegate_user {
            self.chown_data_dir(user).await?;
        }

        debug!(grace = ?self.startup_grace, "waiting for services to settle");
        smol::Timer::after(self.startup_grace).await;
        Ok(())
    }

    /// Hand the data directory to the delegate user
    ///
    /// Keeps later unprivileged reruns able to write state the
    /// escalated run created.
    async fn chown_data_dir(&self, user: &str) -> Result<()> {
        let mut cmd = Command::new("chown");
        cmd.arg("-R")
            .arg(format!("{user}:{user}"))
            .arg(&self.data_dir);
        let line = cmd.display();
        let output = self.runner.run(cmd).await?;
        if !output.success() {
            return Err(Error::command_failed(line, &output));
        }
        Ok(())
    }
}
