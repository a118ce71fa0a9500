//! Container engine installation capability
//!
//! The engine install procedure (repository registration, key import,
//! package install) is consumed behind a single-verb trait. Each step
//! is a blocking external command with inherited stdio so the operator
//! sees package manager progress; any non-zero exit aborts the run.

use crate::{Error, Result};
use async_trait::async_trait;
use command_runner::{Command, Runner};
use tracing::info;

/// Install the container engine onto the host
#[async_trait]
pub trait PackageInstaller {
    /// Register the engine package repository and install the engine
    async fn install_engine(&self) -> Result<()>;
}

/// Debian/apt-based engine installer
pub struct AptInstaller {
    runner: Box<dyn Runner>,
}

impl AptInstaller {
    /// Create an installer issuing commands through the given runner
    pub fn new(runner: Box<dyn Runner>) -> Self {
        Self { runner }
    }

    async fn step(&self, description: &str, cmd: Command) -> Result<()> {
        info!("{description}");
        let line = cmd.display();
        let status = self.runner.run_interactive(cmd).await?;
        if !status.success() {
            return Err(Error::CommandFailed {
                command: line,
                code: status.code,
                detail: "see package manager output above".to_string(),
            });
        }
        Ok(())
    }

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        cmd
    }
}

#[async_trait]
impl PackageInstaller for AptInstaller {
    async fn install_engine(&self) -> Result<()> {
        let mut update = Command::new("apt-get");
        update.args(["update", "-qq"]);
        self.step("updating package index", update).await?;

        let mut prereqs = Command::new("apt-get");
        prereqs.args(["install", "-y", "ca-certificates", "curl"]);
        self.step("installing repository prerequisites", prereqs)
            .await?;

        let mut keyring_dir = Command::new("install");
        keyring_dir.args(["-m", "0755", "-d", "/etc/apt/keyrings"]);
        self.step("creating keyring directory", keyring_dir).await?;

        self.step(
            "importing engine signing key",
            Self::sh(
                "curl -fsSL https://download.docker.com/linux/debian/gpg \
                 -o /etc/apt/keyrings/docker.asc && chmod a+r /etc/apt/keyrings/docker.asc",
            ),
        )
        .await?;

        self.step(
            "registering engine package repository",
            Self::sh(
                "echo \"deb [arch=$(dpkg --print-architecture) \
                 signed-by=/etc/apt/keyrings/docker.asc] \
                 https://download.docker.com/linux/debian \
                 $(. /etc/os-release && echo $VERSION_CODENAME) stable\" \
                 > /etc/apt/sources.list.d/docker.list",
            ),
        )
        .await?;

        let mut refresh = Command::new("apt-get");
        refresh.args(["update", "-qq"]);
        self.step("refreshing package index", refresh).await?;

        let mut install = Command::new("apt-get");
        install.args([
            "install",
            "-y",
            "docker-ce",
            "docker-ce-cli",
            "containerd.io",
            "docker-buildx-plugin",
            "docker-compose-plugin",
        ]);
        self.step("installing container engine", install).await?;

        Ok(())
    }
}
