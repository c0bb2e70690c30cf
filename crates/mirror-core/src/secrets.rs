//! Secret registry shared by everything that may emit attacker-visible text.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Replacement written in place of a registered secret.
pub const MASK: &str = "***";

type RegisterHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Shared set of secrets that must never reach logs or error messages.
///
/// Clones share the same underlying set, so a registry handed to the log
/// writer sees secrets registered later by configuration resolution.
#[derive(Clone, Default)]
pub struct SecretRegistry {
    secrets: Arc<RwLock<Vec<String>>>,
    on_register: Option<RegisterHook>,
}

impl SecretRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that calls `hook` with every newly registered secret.
    ///
    /// The CI frontend uses this to forward secrets to the platform's own
    /// masking facility.
    pub fn with_hook(hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            secrets: Arc::default(),
            on_register: Some(Arc::new(hook)),
        }
    }

    /// Register a secret. Empty strings and duplicates are ignored.
    pub fn register(&self, secret: impl AsRef<str>) {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return;
        }

        {
            let mut secrets = self.secrets.write().unwrap_or_else(PoisonError::into_inner);
            if secrets.iter().any(|known| known == secret) {
                return;
            }
            secrets.push(secret.to_string());
            // Longest first so a secret containing another is masked whole.
            secrets.sort_by(|a, b| b.len().cmp(&a.len()));
        }

        if let Some(hook) = &self.on_register {
            hook(secret);
        }
    }

    /// Replace every registered secret in `text` with [`MASK`].
    pub fn mask(&self, text: &str) -> String {
        let secrets = self.secrets.read().unwrap_or_else(PoisonError::into_inner);
        let mut masked = text.to_string();
        for secret in secrets.iter() {
            if masked.contains(secret.as_str()) {
                masked = masked.replace(secret.as_str(), MASK);
            }
        }
        masked
    }

    pub(crate) fn len(&self) -> usize {
        self.secrets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Debug for SecretRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRegistry")
            .field("secrets", &self.len())
            .field("hook", &self.on_register.is_some())
            .finish()
    }
}
