//! Runs single git invocations and captures their output.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::credentials::redact_url;
use crate::error::{MirrorError, Result};
use crate::secrets::SecretRegistry;

/// Executes one git invocation against a working directory.
///
/// Implementations block until the invocation finishes and return its
/// combined output. The pipeline only talks to git through this trait.
pub trait GitRunner {
    fn run(&self, work_dir: &Path, args: &[String]) -> Result<String>;
}

impl<T: GitRunner + ?Sized> GitRunner for &T {
    fn run(&self, work_dir: &Path, args: &[String]) -> Result<String> {
        (**self).run(work_dir, args)
    }
}

/// Render a git argument vector as a single line, stripping credentials
/// from any URL argument.
pub fn render_command(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.contains("://") {
                redact_url(arg)
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// [`GitRunner`] backed by the system git binary.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: OsString,
    secrets: SecretRegistry,
    verbose: bool,
    env: Vec<(String, String)>,
}

impl ProcessRunner {
    pub fn new(secrets: SecretRegistry) -> Self {
        Self {
            program: OsString::from("git"),
            secrets,
            verbose: false,
            env: Vec::new(),
        }
    }

    /// Use a different git executable.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Log every resolved argument vector before it runs.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Add an environment variable to every invocation.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Render hook for verbose mode.
    fn render(&self, work_dir: &Path, args: &[String]) {
        if let Some(line) = self.rendered_line(work_dir, args) {
            info!(target: "mirror_core::git", "{line}");
        }
    }

    /// The line verbose mode logs for one invocation, or `None` when quiet.
    /// Masking happens here so no call site can forget it.
    fn rendered_line(&self, work_dir: &Path, args: &[String]) -> Option<String> {
        if !self.verbose {
            return None;
        }
        let line = format!(
            "{} -C {} {}",
            self.program.to_string_lossy(),
            work_dir.display(),
            render_command(args)
        );
        Some(self.secrets.mask(&line))
    }

    fn failure(&self, args: &[String], status: Option<i32>, output: &str) -> MirrorError {
        MirrorError::CommandFailed {
            command: self.secrets.mask(&render_command(args)),
            status,
            output: self.secrets.mask(output),
        }
    }
}

impl GitRunner for ProcessRunner {
    fn run(&self, work_dir: &Path, args: &[String]) -> Result<String> {
        std::fs::create_dir_all(work_dir).map_err(|source| MirrorError::WorkspaceUnavailable {
            path: work_dir.to_path_buf(),
            source,
        })?;

        let mut cmd = Command::new(&self.program);
        cmd.arg("-C").arg(work_dir).args(args);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        self.render(work_dir, args);

        let output = cmd
            .output()
            .map_err(|err| self.failure(args, None, &err.to_string()))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&stderr);
        }
        let combined = combined.trim().to_string();

        if !output.status.success() {
            return Err(self.failure(args, output.status.code(), &combined));
        }

        debug!(
            command = %self.secrets.mask(&render_command(args)),
            "git command succeeded"
        );
        Ok(self.secrets.mask(&combined))
    }
}
