#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use mirror_core::config::{AuthenticatedConfig, RunConfiguration};
use mirror_core::credentials::AccessToken;
use mirror_core::error::{MirrorError, Result};
use mirror_core::git::GitRunner;

pub const ORIGINAL_URL: &str = "https://example.com/org/repo.git";
pub const MIRROR_URL: &str = "https://example.com/org/repo-mirror.git";
pub const TOKEN: &str = "abc123";

/// A `GitRunner` that records invocations instead of running git.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<(PathBuf, Vec<String>)>>,
    fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first invocation whose subcommand is `subcommand`.
    pub fn failing_on(subcommand: &str) -> Self {
        Self {
            calls: RefCell::default(),
            fail_on: Some(subcommand.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub fn work_dirs(&self) -> Vec<PathBuf> {
        self.calls
            .borrow()
            .iter()
            .map(|(dir, _)| dir.clone())
            .collect()
    }

    /// Invocations rendered as single lines.
    pub fn lines(&self) -> Vec<String> {
        self.calls().iter().map(|args| args.join(" ")).collect()
    }
}

impl GitRunner for RecordingRunner {
    fn run(&self, work_dir: &Path, args: &[String]) -> Result<String> {
        self.calls
            .borrow_mut()
            .push((work_dir.to_path_buf(), args.to_vec()));

        let failing = self.fail_on.is_some()
            && self.fail_on.as_deref() == args.first().map(String::as_str);
        if failing {
            return Err(MirrorError::CommandFailed {
                command: args.join(" "),
                status: Some(1),
                output: format!("error: simulated {} failure", args[0]),
            });
        }
        Ok(String::new())
    }
}

pub fn run_config() -> RunConfiguration {
    RunConfiguration::new(ORIGINAL_URL, MIRROR_URL, AccessToken::new(TOKEN))
}

pub fn authenticated(config: RunConfiguration) -> AuthenticatedConfig {
    config.authenticate().expect("test urls are valid")
}
