//! End-to-end prepare flow against a temporary policy directory
//!
//! Exercises the public surface only: fakes are built from the
//! exported capability traits, the way an embedder would.

use async_trait::async_trait;
use provision::{
    ContainerCtl, InvocationContext, PolicyEditor, PolicyOutcome, PrepareOutcome,
    PreparePipeline, Prompter, Result, POLICY_DIRECTIVES,
};
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

struct RecordingCtl {
    calls: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ContainerCtl for RecordingCtl {
    async fn exists(&self, ctid: &str) -> Result<bool> {
        self.calls.lock().unwrap().push(format!("exists {ctid}"));
        Ok(true)
    }

    async fn stop(&self, ctid: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("stop {ctid}"));
        Ok(())
    }

    async fn start(&self, ctid: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("start {ctid}"));
        Ok(())
    }
}

struct Answers {
    confirms: VecDeque<bool>,
}

impl Prompter for Answers {
    fn confirm(&mut self, _question: &str, default: bool) -> Result<bool> {
        Ok(self.confirms.pop_front().unwrap_or(default))
    }

    fn read_line(&mut self, _prompt: &str) -> Result<String> {
        Ok(String::new())
    }
}

fn root_ctx() -> InvocationContext {
    InvocationContext::new(
        PathBuf::from("/usr/local/bin/stackctl"),
        vec![OsString::from("prepare"), OsString::from("108")],
        0,
        None,
    )
}

fn pipeline(policy_dir: PathBuf) -> (PreparePipeline, Arc<Mutex<Vec<String>>>) {
    let calls: Arc<Mutex<Vec<String>>> = Arc::default();
    let ctl = RecordingCtl {
        calls: Arc::clone(&calls),
    };
    let editor = PolicyEditor::new(Box::new(ctl), policy_dir);
    (PreparePipeline::new(root_ctx(), None, editor), calls)
}

const BASE_DOC: &str = "arch: amd64\nhostname: media\nostype: debian\n";

#[test]
fn test_prepare_applies_directives_and_defers_restart() {
    smol::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("108.conf"), BASE_DOC).unwrap();
        let (pipeline, calls) = pipeline(dir.path().to_path_buf());

        let mut prompter = Answers {
            confirms: VecDeque::new(),
        };
        let outcome = pipeline
            .run(Some("108".to_string()), &mut prompter)
            .await
            .unwrap();

        match outcome {
            PrepareOutcome::Policy(PolicyOutcome::Applied { backup }) => {
                assert!(backup.exists());
            }
            other => panic!("expected Applied, got {other:?}"),
        }

        let mutated = std::fs::read_to_string(dir.path().join("108.conf")).unwrap();
        for directive in POLICY_DIRECTIVES {
            assert!(mutated.contains(directive));
        }

        // Restart declined by default: no stop/start issued.
        assert_eq!(calls.lock().unwrap().as_slice(), ["exists 108"]);
    });
}

#[test]
fn test_declined_rerun_leaves_single_backup() {
    smol::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("108.conf"), BASE_DOC).unwrap();

        let (first, _) = pipeline(dir.path().to_path_buf());
        let mut prompter = Answers {
            confirms: VecDeque::new(),
        };
        first
            .run(Some("108".to_string()), &mut prompter)
            .await
            .unwrap();

        let after_first = std::fs::read(dir.path().join("108.conf")).unwrap();

        let (second, _) = pipeline(dir.path().to_path_buf());
        let outcome = second
            .run(Some("108".to_string()), &mut prompter)
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            PrepareOutcome::Policy(PolicyOutcome::SkippedAlreadyApplied)
        ));
        assert_eq!(
            after_first,
            std::fs::read(dir.path().join("108.conf")).unwrap()
        );

        let backups = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .contains(".bak.")
            })
            .count();
        assert_eq!(backups, 1, "declined rerun must not create a backup");
    });
}

#[test]
fn test_confirmed_restart_cycles_the_container() {
    smol::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("108.conf"), BASE_DOC).unwrap();
        let (pipeline, calls) = pipeline(dir.path().to_path_buf());

        let mut prompter = Answers {
            confirms: VecDeque::from([true]),
        };
        pipeline
            .run(Some("108".to_string()), &mut prompter)
            .await
            .unwrap();

        assert_eq!(
            calls.lock().unwrap().as_slice(),
            ["exists 108", "stop 108", "start 108"]
        );
    });
}
