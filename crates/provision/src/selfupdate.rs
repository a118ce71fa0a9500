//! Self-update agent
//!
//! Pulls the latest revision of the orchestrator's own source and
//! compares a fingerprint of the entry-point file before and after.
//! If the file changed, the run must continue in a fresh process: the
//! in-memory code of the current process is stale relative to the file
//! on disk, and mixing old and new logic within one process lifetime
//! is never acceptable. The restart itself is performed by the binary,
//! not here.

use crate::context::InvocationContext;
use crate::privilege::RestartRequested;
use crate::source::SourceSync;
use crate::Result;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{info, warn};

/// Outcome of one self-update cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfUpdateOutcome {
    /// The entry point is unchanged; continue in this process
    Unchanged,
    /// The entry point changed; the process must be replaced
    Restart(RestartRequested),
    /// Synchronization failed; continuing on existing local code
    FetchFailed,
}

/// Self-update agent bound to a source checkout
pub struct SelfUpdate {
    source: Box<dyn SourceSync>,
    source_ref: String,
}

impl SelfUpdate {
    /// Create an agent syncing against the given remote reference
    pub fn new(source: Box<dyn SourceSync>, source_ref: impl Into<String>) -> Self {
        Self {
            source,
            source_ref: source_ref.into(),
        }
    }

    /// Run one fetch-compare cycle
    pub async fn run(&self, ctx: &InvocationContext) -> Result<SelfUpdateOutcome> {
        let before = fingerprint(ctx.program())?;

        if let Err(e) = self.source.sync(&self.source_ref).await {
            warn!(error = %e, "self-update fetch failed, continuing with local code");
            return Ok(SelfUpdateOutcome::FetchFailed);
        }

        let after = fingerprint(ctx.program())?;
        if before != after {
            info!(program = %ctx.program().display(), "entry point updated, restart required");
            return Ok(SelfUpdateOutcome::Restart(RestartRequested::reexec(ctx)));
        }

        Ok(SelfUpdateOutcome::Unchanged)
    }
}

/// SHA-256 of a file's contents
fn fingerprint(path: &Path) -> Result<[u8; 32]> {
    let contents = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Result};
    use async_trait::async_trait;
    use std::ffi::OsString;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Fake sync that optionally rewrites the entry point when pulled
    struct FakeSync {
        fail: bool,
        write_on_sync: Option<(PathBuf, &'static str)>,
        refs_seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl SourceSync for FakeSync {
        async fn sync(&self, source_ref: &str) -> Result<()> {
            self.refs_seen.lock().unwrap().push(source_ref.to_string());
            if self.fail {
                return Err(Error::MissingTool("network unreachable".to_string()));
            }
            if let Some((path, contents)) = &self.write_on_sync {
                std::fs::write(path, contents)?;
            }
            Ok(())
        }
    }

    fn ctx_for(program: PathBuf) -> InvocationContext {
        InvocationContext::new(
            program,
            vec![OsString::from("deploy"), OsString::from("--stack-dir"), OsString::from("/srv")],
            1000,
            None,
        )
    }

    #[test]
    fn test_unchanged_when_fetch_leaves_file_alone() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let entry = dir.path().join("stackctl");
            std::fs::write(&entry, "v1").unwrap();

            let update = SelfUpdate::new(
                Box::new(FakeSync {
                    fail: false,
                    write_on_sync: None,
                    refs_seen: Arc::default(),
                }),
                "main",
            );

            let outcome = update.run(&ctx_for(entry)).await.unwrap();
            assert_eq!(outcome, SelfUpdateOutcome::Unchanged);
        });
    }

    #[test]
    fn test_restart_carries_original_argv_when_file_changes() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let entry = dir.path().join("stackctl");
            std::fs::write(&entry, "v1").unwrap();

            let update = SelfUpdate::new(
                Box::new(FakeSync {
                    fail: false,
                    write_on_sync: Some((entry.clone(), "v2")),
                    refs_seen: Arc::default(),
                }),
                "main",
            );

            let ctx = ctx_for(entry.clone());
            match update.run(&ctx).await.unwrap() {
                SelfUpdateOutcome::Restart(restart) => {
                    assert_eq!(restart.program, entry);
                    assert_eq!(restart.args, ctx.args());
                    assert!(!restart.escalate);
                }
                other => panic!("expected restart, got {other:?}"),
            }
        });
    }

    #[test]
    fn test_fetch_failure_degrades_to_local_code() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let entry = dir.path().join("stackctl");
            std::fs::write(&entry, "v1").unwrap();

            let update = SelfUpdate::new(
                Box::new(FakeSync {
                    fail: true,
                    write_on_sync: None,
                    refs_seen: Arc::default(),
                }),
                "main",
            );

            let outcome = update.run(&ctx_for(entry)).await.unwrap();
            assert_eq!(outcome, SelfUpdateOutcome::FetchFailed);
        });
    }

    #[test]
    fn test_source_ref_is_passed_through() {
        smol::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let entry = dir.path().join("stackctl");
            std::fs::write(&entry, "v1").unwrap();

            let refs: Arc<Mutex<Vec<String>>> = Arc::default();
            let sync = FakeSync {
                fail: false,
                write_on_sync: None,
                refs_seen: Arc::clone(&refs),
            };
            let update = SelfUpdate::new(Box::new(sync), "release-2.4");
            update.run(&ctx_for(entry)).await.unwrap();

            assert_eq!(refs.lock().unwrap().as_slice(), ["release-2.4"]);
        });
    }
}
