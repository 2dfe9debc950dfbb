// SecretMasker: registry of secret values (GitHub tokens, runner
// registration tokens) that must never reach a log line in clear text.

use parking_lot::RwLock;
use std::sync::Arc;

/// Replacement text used when a secret is found.
const MASK: &str = "***";

/// Values shorter than this are not registered; masking them would shred
/// ordinary words in the output.
const MIN_SECRET_LENGTH: usize = 4;

/// A thread-safe secret masker that replaces registered values with `***`.
///
/// Cloning is cheap and every clone shares the same registry, so a token
/// registered by the permission validator is masked in the pipeline traces too.
#[derive(Debug, Clone, Default)]
pub struct SecretMasker {
    secrets: Arc<RwLock<Vec<String>>>,
}

impl SecretMasker {
    /// Create a new empty `SecretMasker`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value that should be masked in output.
    /// Blank and very short values are ignored.
    pub fn add_value(&self, secret: &str) {
        let trimmed = secret.trim();
        if trimmed.len() < MIN_SECRET_LENGTH {
            return;
        }

        let mut secrets = self.secrets.write();
        if secrets.iter().any(|s| s == trimmed) {
            return;
        }
        secrets.push(trimmed.to_string());
        // Longest first, so a secret that contains another is masked whole.
        secrets.sort_by(|a, b| b.len().cmp(&a.len()));
    }

    /// Replace all registered values in `input` with `***`.
    pub fn mask_secrets(&self, input: &str) -> String {
        let secrets = self.secrets.read();
        secrets.iter().fold(input.to_string(), |acc, secret| {
            if acc.contains(secret.as_str()) {
                acc.replace(secret.as_str(), MASK)
            } else {
                acc
            }
        })
    }

    /// Returns the number of registered secrets.
    pub fn secret_count(&self) -> usize {
        self.secrets.read().len()
    }
}
