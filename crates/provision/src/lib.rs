//! # Provision
//!
//! Orchestrator core for bringing up a host-local, compose-managed
//! application stack: privilege gating, self-update, container
//! isolation policy editing, stack lifecycle, and status reporting.
//!
//! Every external tool (container engine, package manager, revision
//! control, container control) sits behind a narrow capability trait
//! so the sequencing logic is testable with fakes. All execution is
//! strictly sequential; process replacement (privilege escalation,
//! self-update restart) is surfaced as a [`RestartRequested`] value
//! that the binary acts on at a single call site.

#![warn(missing_docs)]
#![warn(unsafe_code)]

mod context;
mod engine;
mod lifecycle;
mod pipeline;
mod policy;
mod privilege;
mod probe;
mod prompt;
mod report;
mod selfupdate;
mod source;

pub use context::InvocationContext;
pub use engine::{AptInstaller, PackageInstaller};
pub use lifecycle::{ComposeRuntime, StackLifecycle, StackRuntime, StackService};
pub use pipeline::{DeployPipeline, PipelineOutcome, PrepareOutcome, PreparePipeline};
pub use policy::{
    policy_applied, ContainerCtl, PctContainerCtl, PolicyEditor, PolicyOutcome,
    POLICY_DIRECTIVES, POLICY_MARKER,
};
pub use privilege::{ensure_privileged, Gate, RestartRequested};
pub use probe::Probes;
pub use prompt::{Prompter, TerminalPrompter};
pub use report::{StatusReport, StatusReporter, WEB_UI_PORT};
pub use selfupdate::{SelfUpdate, SelfUpdateOutcome};
pub use source::{GitSync, SourceSync};

/// Error types for provisioning operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Command execution error
    #[error("command execution error: {0}")]
    CommandRunner(#[from] command_runner::Error),

    /// A required host tool is missing
    #[error("required tool not available: {0}")]
    MissingTool(String),

    /// Privilege escalation was required but could not be performed
    #[error("insufficient privileges: {0}")]
    PrivilegeRequired(String),

    /// Operator supplied an empty or malformed identifier
    #[error("invalid container identifier: {0}")]
    InvalidContainerId(String),

    /// The target container does not exist
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// An external command exited with a non-zero status
    #[error("{command} failed with exit code {code:?}: {detail}")]
    CommandFailed {
        /// The command line that failed
        command: String,
        /// The exit code, if the process exited normally
        code: Option<i32>,
        /// Captured stderr or a short diagnostic
        detail: String,
    },

    /// Refusing to overwrite an existing backup file
    #[error("backup path already exists: {0}")]
    BackupExists(std::path::PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for provisioning operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a [`Error::CommandFailed`] from a finished command
    pub fn command_failed(command: impl Into<String>, output: &command_runner::Output) -> Self {
        let detail = if output.stderr.trim().is_empty() {
            output.stdout.trim().to_string()
        } else {
            output.stderr.trim().to_string()
        };
        Self::CommandFailed {
            command: command.into(),
            code: output.status.code,
            detail,
        }
    }
}
