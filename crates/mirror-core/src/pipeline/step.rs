//! The fixed sequence of git operations.

use serde::Serialize;

use crate::config::{AuthenticatedConfig, MIRROR_REMOTE, UPSTREAM_REMOTE};
use crate::credentials::AuthenticatedUrl;

/// One git operation of the mirror pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Init,
    AddUpstreamRemote,
    AddMirrorRemote,
    Checkout,
    Pull,
    CreateBranch,
    Push,
}

impl Step {
    /// Every step, in execution order.
    pub const ALL: [Step; 7] = [
        Step::Init,
        Step::AddUpstreamRemote,
        Step::AddMirrorRemote,
        Step::Checkout,
        Step::Pull,
        Step::CreateBranch,
        Step::Push,
    ];

    /// Git arguments for this step. Contains token-embedded URLs for the
    /// remote steps, so never log the result directly.
    pub fn args(self, config: &AuthenticatedConfig) -> Vec<String> {
        self.build(config, |url| url.expose().to_string())
    }

    /// Git arguments with every URL stripped of its credentials.
    pub fn display_args(self, config: &AuthenticatedConfig) -> Vec<String> {
        self.build(config, AuthenticatedUrl::redacted)
    }

    fn build(
        self,
        config: &AuthenticatedConfig,
        url: impl Fn(&AuthenticatedUrl) -> String,
    ) -> Vec<String> {
        match self {
            Step::Init => vec!["init".to_string()],
            Step::AddUpstreamRemote => add_remote(UPSTREAM_REMOTE, url(config.original_url())),
            Step::AddMirrorRemote => add_remote(MIRROR_REMOTE, url(config.mirror_url())),
            Step::Checkout => vec![
                "checkout".to_string(),
                format!("{UPSTREAM_REMOTE}/{}", config.original_branch()),
            ],
            Step::Pull => vec![
                "pull".to_string(),
                UPSTREAM_REMOTE.to_string(),
                config.original_branch().to_string(),
            ],
            Step::CreateBranch => vec!["branch".to_string(), config.mirror_branch().to_string()],
            Step::Push => {
                let mut args = vec![
                    "push".to_string(),
                    "--set-upstream".to_string(),
                    MIRROR_REMOTE.to_string(),
                    config.mirror_branch().to_string(),
                ];
                if config.use_force() {
                    args.push("--force".to_string());
                }
                if config.use_tags() {
                    args.push("--tags".to_string());
                }
                args
            }
        }
    }

    /// Progress message logged before the step runs.
    pub fn describe(self, config: &AuthenticatedConfig) -> String {
        match self {
            Step::Init => "initializing git".to_string(),
            Step::AddUpstreamRemote => format!("adding remote: {UPSTREAM_REMOTE}"),
            Step::AddMirrorRemote => format!("adding remote: {MIRROR_REMOTE}"),
            Step::Checkout => format!("checking out: {UPSTREAM_REMOTE}/{}", config.original_branch()),
            Step::Pull => format!("pulling: {UPSTREAM_REMOTE}/{}", config.original_branch()),
            Step::CreateBranch => format!("creating branch: {}", config.mirror_branch()),
            Step::Push => format!("pushing: {MIRROR_REMOTE}/{}", config.mirror_branch()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::Init => "init",
            Step::AddUpstreamRemote => "add-upstream-remote",
            Step::AddMirrorRemote => "add-mirror-remote",
            Step::Checkout => "checkout",
            Step::Pull => "pull",
            Step::CreateBranch => "create-branch",
            Step::Push => "push",
        }
    }
}

fn add_remote(name: &str, url: String) -> Vec<String> {
    vec![
        "remote".to_string(),
        "add".to_string(),
        name.to_string(),
        url,
        "--fetch".to_string(),
    ]
}
