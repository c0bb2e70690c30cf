//! Run configuration.
//!
//! Raw inputs are resolved once into a [`RunConfiguration`], which is then
//! consumed by [`RunConfiguration::authenticate`] to produce the immutable
//! [`AuthenticatedConfig`] the pipeline reads. The raw repository URLs do not
//! outlive that transition.

mod schema;
mod source;

pub use schema::{InputKey, InputKind, InputSpec, SCHEMA, parse_flag};
pub use source::{EnvInputs, FileInputs, InputSource, LayeredInputs, MapInputs};

use std::collections::HashMap;

use tracing::info;

use crate::credentials::{AccessToken, AuthenticatedUrl, SuffixPolicy, TokenEncoding, UrlError};
use crate::error::{MirrorError, Result};
use crate::secrets::SecretRegistry;

/// Name of the remote pointing at the original repository.
pub const UPSTREAM_REMOTE: &str = "upstream";
/// Name of the remote pointing at the mirror repository.
pub const MIRROR_REMOTE: &str = "mirror";
/// Working directory name, relative to the current directory.
pub const DEFAULT_WORK_DIR: &str = "tmp";

/// Validated inputs for one mirror run.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub original_url: String,
    pub original_branch: String,
    pub mirror_url: String,
    pub mirror_branch: String,
    pub token: AccessToken,
    pub use_force: bool,
    pub use_verbose: bool,
    pub use_tags: bool,
    pub suffix_policy: SuffixPolicy,
}

impl RunConfiguration {
    /// Configuration with default branches and all switches off.
    pub fn new(
        original_url: impl Into<String>,
        mirror_url: impl Into<String>,
        token: AccessToken,
    ) -> Self {
        Self {
            original_url: original_url.into(),
            original_branch: default_of(InputKey::OriginalBranch),
            mirror_url: mirror_url.into(),
            mirror_branch: default_of(InputKey::MirrorBranch),
            token,
            use_force: false,
            use_verbose: false,
            use_tags: false,
            suffix_policy: SuffixPolicy::default(),
        }
    }

    /// Resolve every input in [`SCHEMA`] order.
    ///
    /// Fails on the first missing required input. Both the transport form
    /// and the decoded form of the token are registered with `secrets`
    /// before anything else is logged.
    pub fn from_inputs(inputs: &dyn InputSource, secrets: &SecretRegistry) -> Result<Self> {
        let mut resolved = resolve(SCHEMA, inputs, secrets)?;

        let encoding: TokenEncoding = resolved
            .take(InputKey::TokenEncoding)
            .parse()
            .map_err(MirrorError::TokenDecodeFailure)?;
        let token = AccessToken::decode(&resolved.take(InputKey::Token), encoding)
            .map_err(MirrorError::TokenDecodeFailure)?;
        secrets.register(token.expose());

        let use_force = resolved.flag(InputKey::Force);
        if use_force {
            info!("git will use --force to push");
        }
        let use_verbose = resolved.flag(InputKey::Verbose);
        if use_verbose {
            info!("using verbose mode");
        }
        let use_tags = resolved.flag(InputKey::Tags);
        if use_tags {
            info!("transferring tags");
        }
        let suffix_policy = if resolved.flag(InputKey::AppendGitSuffix) {
            SuffixPolicy::Append
        } else {
            SuffixPolicy::Keep
        };

        Ok(Self {
            original_url: resolved.take(InputKey::OriginalUrl),
            original_branch: resolved.take(InputKey::OriginalBranch),
            mirror_url: resolved.take(InputKey::MirrorUrl),
            mirror_branch: resolved.take(InputKey::MirrorBranch),
            token,
            use_force,
            use_verbose,
            use_tags,
            suffix_policy,
        })
    }

    pub fn with_branches(
        mut self,
        original_branch: impl Into<String>,
        mirror_branch: impl Into<String>,
    ) -> Self {
        self.original_branch = original_branch.into();
        self.mirror_branch = mirror_branch.into();
        self
    }

    pub fn with_force(mut self, use_force: bool) -> Self {
        self.use_force = use_force;
        self
    }

    pub fn with_verbose(mut self, use_verbose: bool) -> Self {
        self.use_verbose = use_verbose;
        self
    }

    pub fn with_tags(mut self, use_tags: bool) -> Self {
        self.use_tags = use_tags;
        self
    }

    pub fn with_suffix_policy(mut self, policy: SuffixPolicy) -> Self {
        self.suffix_policy = policy;
        self
    }

    /// Embed the token into both repository URLs.
    pub fn authenticate(self) -> Result<AuthenticatedConfig> {
        let original_url = AuthenticatedUrl::new(&self.original_url, &self.token, self.suffix_policy)
            .map_err(|err| url_error("original", err))?;
        let mirror_url = AuthenticatedUrl::new(&self.mirror_url, &self.token, self.suffix_policy)
            .map_err(|err| url_error("mirror", err))?;

        Ok(AuthenticatedConfig {
            original_url,
            original_branch: self.original_branch,
            mirror_url,
            mirror_branch: self.mirror_branch,
            use_force: self.use_force,
            use_verbose: self.use_verbose,
            use_tags: self.use_tags,
        })
    }
}

/// Configuration after credential injection. Read-only for the rest of the run.
#[derive(Debug, Clone)]
pub struct AuthenticatedConfig {
    original_url: AuthenticatedUrl,
    original_branch: String,
    mirror_url: AuthenticatedUrl,
    mirror_branch: String,
    use_force: bool,
    use_verbose: bool,
    use_tags: bool,
}

impl AuthenticatedConfig {
    pub fn original_url(&self) -> &AuthenticatedUrl {
        &self.original_url
    }

    pub fn original_branch(&self) -> &str {
        &self.original_branch
    }

    pub fn mirror_url(&self) -> &AuthenticatedUrl {
        &self.mirror_url
    }

    pub fn mirror_branch(&self) -> &str {
        &self.mirror_branch
    }

    pub fn use_force(&self) -> bool {
        self.use_force
    }

    pub fn use_verbose(&self) -> bool {
        self.use_verbose
    }

    pub fn use_tags(&self) -> bool {
        self.use_tags
    }
}

fn url_error(remote: &'static str, err: UrlError) -> MirrorError {
    match err {
        UrlError::InvalidScheme => MirrorError::InvalidScheme { remote },
        other => MirrorError::InvalidUrl {
            remote,
            reason: other.to_string(),
        },
    }
}

/// Input values after defaults have been applied.
#[derive(Debug, Default)]
struct ResolvedInputs {
    values: HashMap<InputKey, String>,
}

impl ResolvedInputs {
    fn take(&mut self, key: InputKey) -> String {
        self.values.remove(&key).unwrap_or_default()
    }

    fn flag(&self, key: InputKey) -> bool {
        self.values.get(&key).is_some_and(|value| parse_flag(value))
    }
}

/// Look up every entry of `schema`, applying defaults.
///
/// A blank or absent value for a required entry is [`MirrorError::MissingInput`].
/// `Secret` values are registered as soon as they are read.
fn resolve(
    schema: &[InputSpec],
    inputs: &dyn InputSource,
    secrets: &SecretRegistry,
) -> Result<ResolvedInputs> {
    let mut resolved = ResolvedInputs::default();
    for spec in schema {
        let value = match lookup(inputs, spec.key) {
            Some(value) => value,
            None if spec.required => return Err(MirrorError::MissingInput(spec.key)),
            None => {
                let fallback = spec.default.unwrap_or_default();
                if spec.kind == InputKind::Text {
                    info!("no {} provided, using '{}'", spec.key.description(), fallback);
                }
                fallback.to_string()
            }
        };
        if spec.kind == InputKind::Secret {
            secrets.register(&value);
        }
        resolved.values.insert(spec.key, value);
    }
    Ok(resolved)
}

fn lookup(inputs: &dyn InputSource, key: InputKey) -> Option<String> {
    inputs
        .get(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn default_of(key: InputKey) -> String {
    key.default().unwrap_or_default().to_string()
}
