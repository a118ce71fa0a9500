//! Source synchronization capability
//!
//! Narrow interface over the revision-control verbs the self-update
//! agent needs: bring the local checkout up to date with a remote
//! reference, shelving any conflicting local modifications first.

use crate::{Error, Result};
use async_trait::async_trait;
use command_runner::{Command, Runner};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Synchronize a local source checkout with its remote
#[async_trait]
pub trait SourceSync {
    /// Update the checkout to the given remote reference
    ///
    /// Local modifications that would conflict are preserved (not
    /// discarded) before synchronizing. Failure leaves the checkout
    /// usable as-is.
    async fn sync(&self, source_ref: &str) -> Result<()>;
}

/// Git-backed source synchronization
pub struct GitSync {
    repo_dir: PathBuf,
    runner: Box<dyn Runner>,
}

impl GitSync {
    /// Create a sync for the repository at `repo_dir`
    pub fn new(repo_dir: PathBuf, runner: Box<dyn Runner>) -> Self {
        Self { repo_dir, runner }
    }

    fn git(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.repo_dir);
        cmd
    }
}

#[async_trait]
impl SourceSync for GitSync {
    async fn sync(&self, source_ref: &str) -> Result<()> {
        // Shelve local edits so the pull cannot conflict. The stash is
        // kept for manual recovery and never restored automatically.
        let status = self.runner.run(self.git(&["status", "--porcelain"])).await?;
        if !status.success() {
            return Err(Error::command_failed("git status", &status));
        }
        if !status.stdout_trimmed().is_empty() {
            let stash_name = format!(
                "stackctl auto-stash {}",
                chrono::Local::now().format("%Y%m%d-%H%M%S")
            );
            warn!(stash = %stash_name, "local modifications detected, shelving before update");
            let stashed = self
                .runner
                .run(self.git(&["stash", "push", "--include-untracked", "-m", &stash_name]))
                .await?;
            if !stashed.success() {
                return Err(Error::command_failed("git stash push", &stashed));
            }
        }

        debug!(source_ref, "pulling latest revision");
        let pulled = self
            .runner
            .run(self.git(&["pull", "--ff-only", "origin", source_ref]))
            .await?;
        if !pulled.success() {
            return Err(Error::command_failed("git pull", &pulled));
        }

        Ok(())
    }
}
