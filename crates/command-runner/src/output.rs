//! Exit status and captured output types

/// Process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    /// Exit code if the process exited normally
    pub code: Option<i32>,
}

impl ExitStatus {
    /// Returns true if the process exited successfully (code 0)
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Exit status plus the output captured while the command ran
#[derive(Debug, Clone)]
pub struct Output {
    /// The process exit status
    pub status: ExitStatus,
    /// Captured stdout, lossily decoded
    pub stdout: String,
    /// Captured stderr, lossily decoded
    pub stderr: String,
}

impl Output {
    /// Returns true if the command exited with code 0
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Trimmed stdout, the common case for single-value queries
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}
