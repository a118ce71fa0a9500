//! Blocking-style command execution for host provisioning
//!
//! This crate provides a small, unified interface for running external
//! commands: directly, or delegated to another user with `sudo -u`.
//! Every call is sequential and waits for the child to exit.

#![warn(missing_docs)]

pub mod backends;
pub mod command;
pub mod error;
pub mod output;
pub mod runner;

pub use command::Command;
pub use error::{Error, Result};
pub use output::{ExitStatus, Output};
pub use runner::Runner;
