//! Access token decoding.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Transport form of the access token input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenEncoding {
    /// Standard-alphabet base64, as CI secrets are usually stored.
    #[default]
    Base64,
    /// The token as-is.
    Plain,
}

impl TokenEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenEncoding::Base64 => "base64",
            TokenEncoding::Plain => "plain",
        }
    }
}

impl FromStr for TokenEncoding {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "base64" | "b64" => Ok(TokenEncoding::Base64),
            "plain" | "raw" => Ok(TokenEncoding::Plain),
            other => Err(format!(
                "unknown token encoding '{other}' (expected 'base64' or 'plain')"
            )),
        }
    }
}

/// A decoded personal access token.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap an already-decoded token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Decode `raw` from its transport `encoding`.
    ///
    /// Trailing newlines are trimmed (secrets are often stored from
    /// `echo ... | base64`). Errors never include bytes of the input.
    pub fn decode(raw: &str, encoding: TokenEncoding) -> Result<Self, String> {
        let decoded = match encoding {
            TokenEncoding::Plain => raw.to_string(),
            TokenEncoding::Base64 => {
                let bytes = STANDARD
                    .decode(raw.trim())
                    .map_err(|_| "token is not valid base64".to_string())?;
                String::from_utf8(bytes).map_err(|_| "token is not valid UTF-8".to_string())?
            }
        };

        let token = decoded.trim_end_matches(['\n', '\r']);
        if token.is_empty() {
            return Err("token is empty".to_string());
        }
        Ok(Self(token.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}
