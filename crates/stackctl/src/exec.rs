//! The single process-replacement call site
//!
//! Both escalation and post-update restarts funnel through here so the
//! rest of the codebase never execs.

use provision::RestartRequested;
use std::os::unix::process::CommandExt;

/// Replace the current process image per the restart request
///
/// On success this never returns. The returned error therefore always
/// means the replacement itself failed.
pub fn replace_process(restart: RestartRequested) -> anyhow::Error {
    let mut cmd = if restart.escalate {
        let mut cmd = std::process::Command::new("sudo");
        cmd.arg(&restart.program);
        cmd.args(&restart.args);
        cmd
    } else {
        let mut cmd = std::process::Command::new(&restart.program);
        cmd.args(&restart.args);
        cmd
    };

    let err = cmd.exec();
    anyhow::anyhow!("failed to replace process with {}: {err}", restart.program.display())
}
