//! Direct local process execution

use crate::command::Command;
use crate::runner::Runner;

/// Runner that executes commands as the current process identity
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalRunner;

impl Runner for LocalRunner {
    fn wrap(&self, command: Command) -> Command {
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_is_identity() {
        let cmd = Command::builder("echo").arg("hello").build();
        let wrapped = LocalRunner.wrap(cmd.clone());

        assert_eq!(wrapped.get_program(), cmd.get_program());
        assert_eq!(wrapped.get_args(), cmd.get_args());
    }
}
