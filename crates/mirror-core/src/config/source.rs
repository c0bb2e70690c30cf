//! Where raw input values come from.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use super::InputKey;

/// A provider of raw string inputs.
///
/// Blank values are treated as absent by callers, matching how CI platforms
/// pass unset inputs as empty strings.
pub trait InputSource {
    fn get(&self, key: InputKey) -> Option<String>;
}

impl<T: InputSource + ?Sized> InputSource for &T {
    fn get(&self, key: InputKey) -> Option<String> {
        (**self).get(key)
    }
}

impl<T: InputSource + ?Sized> InputSource for Box<T> {
    fn get(&self, key: InputKey) -> Option<String> {
        (**self).get(key)
    }
}

/// In-memory inputs.
#[derive(Debug, Clone, Default)]
pub struct MapInputs {
    values: HashMap<InputKey, String>,
}

impl MapInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: InputKey, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: InputKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl InputSource for MapInputs {
    fn get(&self, key: InputKey) -> Option<String> {
        self.values.get(&key).cloned()
    }
}

/// Inputs read from environment variables named by [`InputKey::env_var`].
#[derive(Debug, Clone, Default)]
pub struct EnvInputs {
    vars: HashMap<String, String>,
}

impl EnvInputs {
    /// Snapshot the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped; none of
    /// them can be an input.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars_os().filter_map(|(key, value)| {
            Some((key.into_string().ok()?, value.into_string().ok()?))
        }))
    }

    /// Build from explicit variable pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl InputSource for EnvInputs {
    fn get(&self, key: InputKey) -> Option<String> {
        self.vars.get(&key.env_var()).cloned()
    }
}

/// Inputs read from a TOML file using the recognised key names.
///
/// ```toml
/// originalURL = "https://example.com/org/repo.git"
/// mirrorURL = "https://example.com/org/repo-mirror.git"
/// force = true
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileInputs {
    values: HashMap<InputKey, String>,
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct RawFile(BTreeMap<String, toml::Value>);

impl FileInputs {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
        Self::parse(&content).map_err(|err| format!("{}: {err}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let RawFile(raw) =
            toml::from_str(content).map_err(|err| format!("invalid TOML: {}", err.message()))?;

        let mut values = HashMap::new();
        for (name, value) in raw {
            let Some(key) = InputKey::from_name(&name) else {
                warn!(key = %name, "ignoring unknown config key");
                continue;
            };
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Integer(i) => i.to_string(),
                other => {
                    return Err(format!(
                        "key '{name}' must be a string or boolean, found {}",
                        other.type_str()
                    ));
                }
            };
            values.insert(key, value);
        }
        Ok(Self { values })
    }
}

impl InputSource for FileInputs {
    fn get(&self, key: InputKey) -> Option<String> {
        self.values.get(&key).cloned()
    }
}

/// Several sources consulted in order; the first non-blank value wins.
#[derive(Default)]
pub struct LayeredInputs {
    layers: Vec<Box<dyn InputSource>>,
}

impl LayeredInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lower-priority layer.
    pub fn layer(mut self, source: impl InputSource + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }
}

impl InputSource for LayeredInputs {
    fn get(&self, key: InputKey) -> Option<String> {
        self.layers
            .iter()
            .filter_map(|layer| layer.get(key))
            .find(|value| !value.trim().is_empty())
    }
}
