//! Credential injection for https repository URLs.
//!
//! A personal access token is embedded as the user-info component of the
//! remote URL so git can authenticate without a credential store:
//! `https://host/org/repo.git` becomes `https://<token>@host/org/repo.git`.

use std::fmt;

use tracing::warn;

mod token;

pub use token::{AccessToken, TokenEncoding};

const HTTPS_PREFIX: &str = "https://";
const GIT_SUFFIX: &str = ".git";

/// Why a URL could not carry a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
    /// The URL does not start with `https://`.
    InvalidScheme,
    /// The URL is not well formed or has no host.
    Malformed(String),
    /// The URL already carries user-info.
    EmbeddedCredentials,
}

impl fmt::Display for UrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlError::InvalidScheme => f.write_str("url is not https"),
            UrlError::Malformed(reason) => write!(f, "url is malformed: {reason}"),
            UrlError::EmbeddedCredentials => f.write_str("url already contains credentials"),
        }
    }
}

impl std::error::Error for UrlError {}

/// Whether URLs missing a `.git` suffix are normalised before injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuffixPolicy {
    /// Use the URL exactly as given.
    #[default]
    Keep,
    /// Append `.git` when missing and warn about it.
    Append,
}

/// Embed `token` into an https `url`.
///
/// The token is spliced in verbatim; it is not validated or percent-encoded.
pub fn inject(url: &str, token: &str) -> Result<String, UrlError> {
    let Some(rest) = url.strip_prefix(HTTPS_PREFIX) else {
        return Err(UrlError::InvalidScheme);
    };

    let parsed = url::Url::parse(url).map_err(|err| UrlError::Malformed(err.to_string()))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::Malformed("missing host".to_string()));
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return Err(UrlError::EmbeddedCredentials);
    }

    Ok(format!("{HTTPS_PREFIX}{token}@{rest}"))
}

/// Apply `policy` to `url`, returning the possibly rewritten URL.
pub fn normalize_suffix(url: &str, policy: SuffixPolicy) -> String {
    match policy {
        SuffixPolicy::Keep => url.to_string(),
        SuffixPolicy::Append if url.ends_with(GIT_SUFFIX) => url.to_string(),
        SuffixPolicy::Append => {
            warn!(
                url = %redact_url(url),
                "url doesn't end with .git, adding it (this might cause the run to fail)"
            );
            format!("{url}{GIT_SUFFIX}")
        }
    }
}

/// Strip any user-info from `url` so it is safe to display.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{scheme}://{}", &rest[at + 1..]),
        None => url.to_string(),
    }
}

/// A repository URL with an access token embedded.
///
/// Has no `Display` impl and a redacted `Debug` impl; the raw value is only
/// reachable through [`AuthenticatedUrl::expose`] when building git arguments.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedUrl(String);

impl AuthenticatedUrl {
    /// Normalise and inject `token` into `url`.
    pub fn new(url: &str, token: &AccessToken, policy: SuffixPolicy) -> Result<Self, UrlError> {
        let normalized = normalize_suffix(url, policy);
        inject(&normalized, token.expose()).map(Self)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The URL with the token removed.
    pub fn redacted(&self) -> String {
        redact_url(&self.0)
    }
}

impl fmt::Debug for AuthenticatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthenticatedUrl")
            .field(&self.redacted())
            .finish()
    }
}
