//! Subcommand implementations

pub mod deploy;
pub mod prepare;
pub mod status;

use provision::InvocationContext;
use std::path::{Path, PathBuf};

/// The checkout the tool updates itself from: where the entry point lives
pub(crate) fn repo_dir(ctx: &InvocationContext) -> PathBuf {
    ctx.program()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
