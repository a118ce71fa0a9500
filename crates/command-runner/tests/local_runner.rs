//! Tests for direct local command execution

use command_runner::backends::LocalRunner;
use command_runner::{Command, Runner};

#[test]
fn test_basic_echo() {
    smol::block_on(async {
        let cmd = Command::builder("echo").arg("hello world").build();

        let output = LocalRunner.run(cmd).await.unwrap();

        assert!(output.success());
        assert_eq!(output.stdout_trimmed(), "hello world");
    });
}

#[test]
fn test_command_with_env_vars() {
    smol::block_on(async {
        let cmd = Command::builder("sh")
            .arg("-c")
            .arg("echo $TEST_VAR")
            .env("TEST_VAR", "test_value")
            .build();

        let output = LocalRunner.run(cmd).await.unwrap();

        assert!(output.success());
        assert_eq!(output.stdout_trimmed(), "test_value");
    });
}

#[test]
fn test_working_directory() {
    smol::block_on(async {
        let cmd = Command::builder("pwd").current_dir("/tmp").build();

        let output = LocalRunner.run(cmd).await.unwrap();

        assert!(output.success());
        assert_eq!(output.stdout_trimmed(), "/tmp");
    });
}

#[test]
fn test_nonzero_exit_is_not_an_error() {
    smol::block_on(async {
        let cmd = Command::builder("sh").arg("-c").arg("exit 3").build();

        let output = LocalRunner.run(cmd).await.unwrap();

        assert!(!output.success());
        assert_eq!(output.status.code, Some(3));
    });
}

#[test]
fn test_stderr_is_captured_separately() {
    smol::block_on(async {
        let cmd = Command::builder("sh")
            .arg("-c")
            .arg("echo out; echo err >&2")
            .build();

        let output = LocalRunner.run(cmd).await.unwrap();

        assert_eq!(output.stdout_trimmed(), "out");
        assert_eq!(output.stderr.trim(), "err");
    });
}

#[test]
fn test_missing_program_reports_command_not_found() {
    smol::block_on(async {
        let cmd = Command::new("definitely-not-a-real-binary-42");

        let err = LocalRunner.run(cmd).await.unwrap_err();

        match err {
            command_runner::Error::CommandNotFound { command } => {
                assert_eq!(command, "definitely-not-a-real-binary-42");
            }
            other => panic!("unexpected error: {other}"),
        }
    });
}
