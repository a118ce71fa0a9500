//! Delegation runner: execute commands as another (non-privileged) user
//!
//! Used when the orchestrator itself runs escalated but wants the
//! artifacts a command creates (containers, volumes, files) owned by
//! the original invoking user rather than root.

use crate::command::Command;
use crate::runner::Runner;

/// Runner that executes commands as a different user via `sudo -u`
#[derive(Debug, Clone)]
pub struct AsUserRunner<R> {
    user: String,
    inner: R,
}

impl<R> AsUserRunner<R> {
    /// Create a runner delegating to the given user
    pub fn new(user: impl Into<String>, inner: R) -> Self {
        Self {
            user: user.into(),
            inner,
        }
    }

    /// The user commands are delegated to
    pub fn user(&self) -> &str {
        &self.user
    }
}

impl<R> Runner for AsUserRunner<R>
where
    R: Runner,
{
    fn wrap(&self, command: Command) -> Command {
        let mut builder = Command::builder("sudo")
            .arg("-u")
            .arg(&self.user)
            .arg("--")
            .arg(command.get_program())
            .args(command.get_args());

        for (key, val) in command.get_envs() {
            builder = builder.env(key, val);
        }
        if let Some(dir) = command.get_current_dir() {
            builder = builder.current_dir(dir);
        }

        self.inner.wrap(builder.build())
    }
}
