//! Invocation context captured at process start
//!
//! The ambient identity environment (effective uid, `SUDO_USER`) is
//! read exactly once and carried as an explicit value, so delegation
//! decisions are visible in signatures instead of hidden `env::var`
//! reads scattered through the code.

use nix::unistd::Uid;
use std::ffi::OsString;
use std::path::PathBuf;

/// Immutable snapshot of how (and as whom) this process was started
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// Absolute path of the running entry point
    program: PathBuf,
    /// Original argument vector, without argv[0]
    args: Vec<OsString>,
    /// Effective uid at capture time
    euid: Uid,
    /// The pre-escalation user, when running under sudo
    invoking_user: Option<String>,
}

impl InvocationContext {
    /// Capture the context of the current process
    ///
    /// Must be called before anything mutates the environment. The
    /// entry-point path is the one the self-update fingerprint and the
    /// re-exec both refer to.
    pub fn capture() -> std::io::Result<Self> {
        let program = std::env::current_exe()?;
        let args = std::env::args_os().skip(1).collect();
        let invoking_user = std::env::var("SUDO_USER").ok().filter(|u| !u.is_empty());

        Ok(Self {
            program,
            args,
            euid: Uid::effective(),
            invoking_user,
        })
    }

    /// Construct a context explicitly (used by tests)
    pub fn new(
        program: PathBuf,
        args: Vec<OsString>,
        euid: u32,
        invoking_user: Option<String>,
    ) -> Self {
        Self {
            program,
            args,
            euid: Uid::from_raw(euid),
            invoking_user,
        }
    }

    /// Path of the running entry point
    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Original argument vector (without argv[0])
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Whether the effective uid is root
    pub fn is_root(&self) -> bool {
        self.euid.is_root()
    }

    /// The user engine commands should be delegated to
    ///
    /// When escalation happened via sudo this is the original invoking
    /// user; otherwise there is nobody to delegate to and commands run
    /// as the current identity.
    pub fn delegate_user(&self) -> Option<&str> {
        if self.is_root() {
            self.invoking_user.as_deref().filter(|u| *u != "root")
        } else {
            None
        }
    }
}
