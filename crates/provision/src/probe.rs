//! Capability probes
//!
//! Side-effect-free checks of host preconditions. Nothing here is
//! cached: system state can change between runs (or be changed by an
//! earlier stage of the same run), so every answer is recomputed from
//! live state on demand.

use crate::{Error, Result};
use command_runner::{Command, Runner};
use tracing::debug;

/// Host capability probes
pub struct Probes {
    runner: Box<dyn Runner>,
}

impl Probes {
    /// Create probes running queries through the given runner
    pub fn new(runner: Box<dyn Runner>) -> Self {
        Self { runner }
    }

    /// Whether the container engine binary is present on the host
    pub async fn engine_installed(&self) -> Result<bool> {
        let mut cmd = Command::new("docker");
        cmd.arg("--version");
        match self.runner.run(cmd).await {
            Ok(output) => Ok(output.success()),
            Err(command_runner::Error::CommandNotFound { .. }) => {
                debug!("docker binary not found");
                Ok(false)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    /// Whether the compose plugin is usable
    pub async fn compose_available(&self) -> Result<bool> {
        let mut cmd = Command::new("docker");
        cmd.args(["compose", "version"]);
        match self.runner.run(cmd).await {
            Ok(output) => Ok(output.success()),
            Err(command_runner::Error::CommandNotFound { .. }) => Ok(false),
            Err(e) => Err(Error::from(e)),
        }
    }

    /// Whether `user` is a member of the engine's access group
    pub async fn user_in_docker_group(&self, user: &str) -> Result<bool> {
        let mut cmd = Command::new("id");
        cmd.args(["-nG", user]);
        let output = self.runner.run(cmd).await?;
        if !output.success() {
            return Ok(false);
        }
        Ok(output
            .stdout
            .split_whitespace()
            .any(|group| group == "docker"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use command_runner::backends::LocalRunner;
    use command_runner::Output;

    struct AbsentEngine;

    #[async_trait]
    impl Runner for AbsentEngine {
        fn wrap(&self, command: Command) -> Command {
            command
        }

        async fn run(&self, _command: Command) -> command_runner::Result<Output> {
            Err(command_runner::Error::CommandNotFound {
                command: "docker".to_string(),
            })
        }
    }

    #[test]
    fn test_missing_engine_binary_probes_as_absent() {
        smol::block_on(async {
            let probes = Probes::new(Box::new(AbsentEngine));
            assert!(!probes.engine_installed().await.unwrap());
            assert!(!probes.compose_available().await.unwrap());
        });
    }

    #[test]
    fn test_group_probe_parses_membership() {
        smol::block_on(async {
            let probes = Probes::new(Box::new(LocalRunner));
            // Probe a user guaranteed to exist; the assertion is only
            // that the query parses, not that docker is installed.
            let result = probes.user_in_docker_group("root").await.unwrap();
            let _ = result;
        });
    }
}
