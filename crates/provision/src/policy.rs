//! Isolation policy editor
//!
//! Mutates a container's line-oriented config document to permit
//! nested containerization: mandatory-access-control confinement off,
//! unrestricted device-cgroup access, no dropped capabilities, and
//! read-write `proc`/`sys` mounts. The block is appended verbatim and
//! at most once; a fresh timestamped backup precedes every mutation.

use crate::prompt::Prompter;
use crate::{Error, Result};
use async_trait::async_trait;
use command_runner::{Command, Runner};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The directive whose presence marks an already-configured document
pub const POLICY_MARKER: &str = "lxc.apparmor.profile: unconfined";

/// The full directive block, applied in this order
pub const POLICY_DIRECTIVES: [&str; 4] = [
    "lxc.apparmor.profile: unconfined",
    "lxc.cgroup2.devices.allow: a",
    "lxc.cap.drop:",
    "lxc.mount.auto: proc:rw sys:rw",
];

/// Whether a policy document already carries the directive block
pub fn policy_applied(document: &str) -> bool {
    document.lines().any(|line| line.trim() == POLICY_MARKER)
}

/// Control verbs for the container the policy targets
#[async_trait]
pub trait ContainerCtl {
    /// Whether the container exists at all
    async fn exists(&self, ctid: &str) -> Result<bool>;
    /// Stop the container, blocking until done
    async fn stop(&self, ctid: &str) -> Result<()>;
    /// Start the container, blocking until done
    async fn start(&self, ctid: &str) -> Result<()>;
}

/// `pct`-backed container control (Proxmox hosts)
pub struct PctContainerCtl {
    runner: Box<dyn Runner>,
}

impl PctContainerCtl {
    /// Create a control handle issuing `pct` commands via the runner
    pub fn new(runner: Box<dyn Runner>) -> Self {
        Self { runner }
    }

    async fn pct(&self, verb: &str, ctid: &str) -> Result<()> {
        let mut cmd = Command::new("pct");
        cmd.args([verb, ctid]);
        let line = cmd.display();
        let output = self.runner.run(cmd).await?;
        if !output.success() {
            return Err(Error::command_failed(line, &output));
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerCtl for PctContainerCtl {
    async fn exists(&self, ctid: &str) -> Result<bool> {
        let mut cmd = Command::new("pct");
        cmd.args(["status", ctid]);
        match self.runner.run(cmd).await {
            Ok(output) => Ok(output.success()),
            Err(command_runner::Error::CommandNotFound { command }) => {
                Err(Error::MissingTool(command))
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    async fn stop(&self, ctid: &str) -> Result<()> {
        self.pct("stop", ctid).await
    }

    async fn start(&self, ctid: &str) -> Result<()> {
        self.pct("start", ctid).await
    }
}

/// Outcome of one policy application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// The block was appended for the first time
    Applied {
        /// The backup file created before mutation
        backup: PathBuf,
    },
    /// The block was already present and the operator confirmed reapply
    Reapplied {
        /// The backup file created before mutation
        backup: PathBuf,
    },
    /// The block was already present; operator declined, file untouched
    SkippedAlreadyApplied,
}

/// Editor for per-container isolation policy documents
pub struct PolicyEditor {
    ctl: Box<dyn ContainerCtl>,
    policy_dir: PathBuf,
}

impl PolicyEditor {
    /// Create an editor for documents under `policy_dir`
    pub fn new(ctl: Box<dyn ContainerCtl>, policy_dir: PathBuf) -> Self {
        Self { ctl, policy_dir }
    }

    /// Path of the policy document for a container
    pub fn document_path(&self, ctid: &str) -> PathBuf {
        self.policy_dir.join(format!("{ctid}.conf"))
    }

    /// Apply the nesting directive block to a container's document
    ///
    /// Aborts before touching any file when the identifier is invalid
    /// or the container does not exist. When the marker is already
    /// present the operator is asked before reapplying; the default
    /// answer declines and leaves the document byte-for-byte unchanged.
    pub async fn apply(
        &self,
        ctid: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<PolicyOutcome> {
        validate_ctid(ctid)?;

        if !self.ctl.exists(ctid).await? {
            return Err(Error::ContainerNotFound(ctid.to_string()));
        }

        let path = self.document_path(ctid);
        let document = std::fs::read_to_string(&path)?;

        let reapplying = policy_applied(&document);
        if reapplying {
            warn!(ctid, "policy directives already present");
            let confirmed = prompter.confirm(
                &format!("Container {ctid} already has the nesting directives. Apply them again?"),
                false,
            )?;
            if !confirmed {
                info!(ctid, "leaving policy document unchanged");
                return Ok(PolicyOutcome::SkippedAlreadyApplied);
            }
        }

        let backup = self.back_up(&path)?;
        if let Err(e) = self.append_directives(&path, &document) {
            // The mutation never landed; leave the directory as found.
            let _ = std::fs::remove_file(&backup);
            return Err(e);
        }
        info!(ctid, backup = %backup.display(), "policy directives applied");

        self.offer_restart(ctid, prompter).await?;

        Ok(if reapplying {
            PolicyOutcome::Reapplied { backup }
        } else {
            PolicyOutcome::Applied { backup }
        })
    }

    /// Copy the document to a sibling path carrying a fresh timestamp
    fn back_up(&self, path: &Path) -> Result<PathBuf> {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let backup = path.with_extension(format!("conf.bak.{stamp}"));
        if backup.exists() {
            // Two mutations within one second; refuse to reuse a backup.
            return Err(Error::BackupExists(backup));
        }
        std::fs::copy(path, &backup)?;
        Ok(backup)
    }

    /// Append the directive block, never rewriting prior lines
    fn append_directives(&self, path: &Path, document: &str) -> Result<()> {
        let mut block = String::new();
        if !document.is_empty() && !document.ends_with('\n') {
            block.push('\n');
        }
        for directive in POLICY_DIRECTIVES {
            block.push_str(directive);
            block.push('\n');
        }

        let mut file = std::fs::OpenOptions::new().append(true).open(path)?;
        file.write_all(block.as_bytes())?;
        Ok(())
    }

    async fn offer_restart(&self, ctid: &str, prompter: &mut dyn Prompter) -> Result<()> {
        let restart = prompter.confirm(
            &format!("Restart container {ctid} now to pick up the new policy?"),
            false,
        )?;
        if restart {
            info!(ctid, "restarting container");
            self.ctl.stop(ctid).await?;
            self.ctl.start(ctid).await?;
        } else {
            println!("Restart deferred. Apply manually with: pct stop {ctid} && pct start {ctid}");
        }
        Ok(())
    }
}

fn validate_ctid(ctid: &str) -> Result<()> {
    if ctid.is_empty() {
        return Err(Error::InvalidContainerId("empty identifier".to_string()));
    }
    if !ctid.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidContainerId(ctid.to_string()));
    }
    Ok(())
}
