//! Error types for mirror runs.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::InputKey;
use crate::pipeline::PipelineState;

/// Every way a mirror run can fail.
///
/// Messages never contain an access token or a token-embedded URL. Output
/// captured from git is masked before it is stored in [`MirrorError::CommandFailed`].
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("no {} provided (input `{}`)", .0.description(), .0.name())]
    MissingInput(InputKey),

    #[error("failed to decode access token: {0}")]
    TokenDecodeFailure(String),

    #[error("{remote} repository url is not https")]
    InvalidScheme { remote: &'static str },

    #[error("{remote} repository url is invalid: {reason}")]
    InvalidUrl { remote: &'static str, reason: String },

    #[error("working directory {} is unavailable: {source}", .path.display())]
    WorkspaceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command} failed ({})", status_label(.status))]
    CommandFailed {
        command: String,
        status: Option<i32>,
        output: String,
    },

    #[error("pipeline cannot be resumed from state {state:?}")]
    NotResumable { state: PipelineState },
}

/// Coarse classification of a [`MirrorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Detected while resolving inputs, before the pipeline starts.
    Configuration,
    /// Detected while injecting credentials into a repository url.
    Url,
    /// Detected while running a pipeline step.
    Process,
}

impl MirrorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MirrorError::MissingInput(_) | MirrorError::TokenDecodeFailure(_) => {
                ErrorCategory::Configuration
            }
            MirrorError::InvalidScheme { .. } | MirrorError::InvalidUrl { .. } => {
                ErrorCategory::Url
            }
            MirrorError::WorkspaceUnavailable { .. }
            | MirrorError::CommandFailed { .. }
            | MirrorError::NotResumable { .. } => ErrorCategory::Process,
        }
    }

    /// Captured git output, if this error came from a git invocation.
    pub fn output(&self) -> Option<&str> {
        match self {
            MirrorError::CommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

fn status_label(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "could not be started".to_string(),
    }
}

/// Result type alias for mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;
