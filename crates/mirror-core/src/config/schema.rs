//! Recognised inputs and their defaults.

use std::fmt;

/// How an input's raw string value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Free text (URLs, branch names).
    Text,
    /// Boolean switch, true iff the value is `true`.
    Flag,
    /// Must be registered with the secret registry as soon as it is read.
    Secret,
    /// One of a fixed set of words.
    Choice,
}

/// Every input a run recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputKey {
    OriginalUrl,
    OriginalBranch,
    MirrorUrl,
    MirrorBranch,
    Token,
    TokenEncoding,
    Force,
    Verbose,
    Tags,
    AppendGitSuffix,
}

/// Static description of one input.
#[derive(Debug, Clone, Copy)]
pub struct InputSpec {
    pub key: InputKey,
    pub required: bool,
    pub default: Option<&'static str>,
    pub kind: InputKind,
}

/// All inputs, in resolution order.
pub const SCHEMA: &[InputSpec] = &[
    InputSpec {
        key: InputKey::OriginalUrl,
        required: true,
        default: None,
        kind: InputKind::Text,
    },
    InputSpec {
        key: InputKey::OriginalBranch,
        required: false,
        default: Some("master"),
        kind: InputKind::Text,
    },
    InputSpec {
        key: InputKey::MirrorUrl,
        required: true,
        default: None,
        kind: InputKind::Text,
    },
    InputSpec {
        key: InputKey::MirrorBranch,
        required: false,
        default: Some("mirror"),
        kind: InputKind::Text,
    },
    InputSpec {
        key: InputKey::Token,
        required: true,
        default: None,
        kind: InputKind::Secret,
    },
    InputSpec {
        key: InputKey::TokenEncoding,
        required: false,
        default: Some("base64"),
        kind: InputKind::Choice,
    },
    InputSpec {
        key: InputKey::Force,
        required: false,
        default: Some("false"),
        kind: InputKind::Flag,
    },
    InputSpec {
        key: InputKey::Verbose,
        required: false,
        default: Some("false"),
        kind: InputKind::Flag,
    },
    InputSpec {
        key: InputKey::Tags,
        required: false,
        default: Some("false"),
        kind: InputKind::Flag,
    },
    InputSpec {
        key: InputKey::AppendGitSuffix,
        required: false,
        default: Some("false"),
        kind: InputKind::Flag,
    },
];

impl InputKey {
    /// The key as written in workflow files and config files.
    pub fn name(self) -> &'static str {
        match self {
            InputKey::OriginalUrl => "originalURL",
            InputKey::OriginalBranch => "originalBranch",
            InputKey::MirrorUrl => "mirrorURL",
            InputKey::MirrorBranch => "mirrorBranch",
            InputKey::Token => "pat",
            InputKey::TokenEncoding => "patEncoding",
            InputKey::Force => "force",
            InputKey::Verbose => "verbose",
            InputKey::Tags => "tags",
            InputKey::AppendGitSuffix => "appendGitSuffix",
        }
    }

    /// Human-readable description used in messages.
    pub fn description(self) -> &'static str {
        match self {
            InputKey::OriginalUrl => "original repository url",
            InputKey::OriginalBranch => "original branch",
            InputKey::MirrorUrl => "mirror repository url",
            InputKey::MirrorBranch => "mirror branch",
            InputKey::Token => "personal access token",
            InputKey::TokenEncoding => "personal access token encoding",
            InputKey::Force => "force flag",
            InputKey::Verbose => "verbose flag",
            InputKey::Tags => "tags flag",
            InputKey::AppendGitSuffix => "append .git suffix flag",
        }
    }

    /// Environment variable carrying this input under GitHub Actions.
    ///
    /// Actions exposes `with:` inputs as `INPUT_<NAME>` with the name
    /// upper-cased and spaces replaced by underscores.
    pub fn env_var(self) -> String {
        format!("INPUT_{}", self.name().replace(' ', "_").to_uppercase())
    }

    pub fn spec(self) -> &'static InputSpec {
        SCHEMA
            .iter()
            .find(|spec| spec.key == self)
            .unwrap_or_else(|| unreachable!("every input key has a schema entry"))
    }

    pub fn default(self) -> Option<&'static str> {
        self.spec().default
    }

    /// Look up a key by its recognised name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        SCHEMA
            .iter()
            .map(|spec| spec.key)
            .find(|key| key.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for InputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Interpret a flag value.
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
