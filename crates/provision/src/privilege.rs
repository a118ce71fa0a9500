//! Privilege gate: verify or request escalation
//!
//! Escalation is never performed here. When the current identity is
//! insufficient the gate returns a [`RestartRequested`] describing the
//! `sudo` re-invocation; the binary performs the actual process
//! replacement at its single exec call site.

use crate::context::InvocationContext;
use crate::{Error, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::info;

/// A request to replace the current process image
///
/// Carries the program and the verbatim original argument vector, so
/// the successor process re-runs the same invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartRequested {
    /// Program to execute
    pub program: PathBuf,
    /// Arguments to pass (without argv[0])
    pub args: Vec<OsString>,
    /// Whether the re-invocation must go through sudo
    pub escalate: bool,
}

impl RestartRequested {
    /// Re-invocation of the same entry point under sudo
    pub fn escalated(ctx: &InvocationContext) -> Self {
        Self {
            program: ctx.program().clone(),
            args: ctx.args().to_vec(),
            escalate: true,
        }
    }

    /// Re-invocation of the (possibly updated) entry point as-is
    pub fn reexec(ctx: &InvocationContext) -> Self {
        Self {
            program: ctx.program().clone(),
            args: ctx.args().to_vec(),
            escalate: false,
        }
    }
}

/// Outcome of the privilege gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// The current identity already satisfies the requirement
    Satisfied,
    /// The process must be replaced by an escalated re-invocation
    Restart(RestartRequested),
}

/// Ensure the process runs as root, or request an escalated restart
///
/// `sudo` must be present for the restart to be performable; its
/// absence is fatal here rather than at exec time so the diagnostic
/// names the real problem.
pub fn ensure_privileged(ctx: &InvocationContext) -> Result<Gate> {
    if ctx.is_root() {
        return Ok(Gate::Satisfied);
    }

    if which("sudo").is_none() {
        return Err(Error::PrivilegeRequired(
            "root privileges are required and sudo is not available".to_string(),
        ));
    }

    info!("not running as root, re-executing under sudo");
    Ok(Gate::Restart(RestartRequested::escalated(ctx)))
}

/// Resolve a program name against PATH
pub(crate) fn which(program: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}
