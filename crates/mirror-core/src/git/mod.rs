//! Git process execution.
//!
//! All git semantics are delegated to the system `git` binary. Every call
//! runs against an explicit working directory via `git -C <dir>`.

mod runner;

pub use runner::{GitRunner, ProcessRunner, render_command};
