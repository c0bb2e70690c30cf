//! Mirror Core Library
//!
//! Mirrors one branch of an "original" git repository onto a "mirror"
//! repository by driving a local working copy through a fixed sequence of
//! git operations, authenticating both remotes with an access token embedded
//! in their https URLs.

pub mod config;
pub mod credentials;
pub mod error;
pub mod git;
pub mod pipeline;
pub mod secrets;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{
        AuthenticatedConfig, EnvInputs, FileInputs, InputKey, InputSource, LayeredInputs,
        MapInputs, RunConfiguration,
    };

    // Credentials
    pub use crate::credentials::{AccessToken, SuffixPolicy, TokenEncoding};

    // Errors
    pub use crate::error::{ErrorCategory, MirrorError, Result};

    // Git
    pub use crate::git::{GitRunner, ProcessRunner};

    // Pipeline
    pub use crate::pipeline::{MirrorPipeline, PipelineState, RunReport, Step};

    // Secrets
    pub use crate::secrets::SecretRegistry;
}
