//! Runner trait for executing commands in different privilege contexts

use crate::command::Command;
use crate::error::{Error, Result};
use crate::output::{ExitStatus, Output};
use async_process::Stdio;
use async_trait::async_trait;
use tracing::debug;

/// A runner that can execute commands in a specific privilege context
///
/// Implementations only rewrite the command line (`wrap`); the actual
/// spawn-and-wait is shared by the provided methods. Both entry points
/// block until the child exits.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Rewrite a command for this execution context
    ///
    /// The identity runner returns the command unchanged; privilege
    /// wrappers prepend `sudo` and re-home environment and working
    /// directory onto the outer command.
    fn wrap(&self, command: Command) -> Command;

    /// Execute a command and wait for it, capturing stdout and stderr
    async fn run(&self, command: Command) -> Result<Output> {
        let wrapped = self.wrap(command);
        debug!(command = %wrapped.display(), "running command");

        let mut async_cmd = wrapped.prepare();
        async_cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = async_cmd
            .output()
            .await
            .map_err(|e| spawn_error(&wrapped, e))?;

        Ok(Output {
            status: output.status.into(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Execute a command with inherited stdio and wait for it
    ///
    /// Used for children that talk to the operator's terminal directly:
    /// `sudo` password prompts, package manager progress output.
    async fn run_interactive(&self, command: Command) -> Result<ExitStatus> {
        let wrapped = self.wrap(command);
        debug!(command = %wrapped.display(), "running interactive command");

        let mut async_cmd = wrapped.prepare();
        async_cmd
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let status = async_cmd
            .status()
            .await
            .map_err(|e| spawn_error(&wrapped, e))?;

        Ok(status.into())
    }
}

fn spawn_error(command: &Command, err: std::io::Error) -> Error {
    if err.kind() == std::io::ErrorKind::NotFound {
        Error::CommandNotFound {
            command: command.get_program().to_string_lossy().into_owned(),
        }
    } else {
        Error::spawn_failed(format!("{}: {}", command.display(), err))
    }
}
