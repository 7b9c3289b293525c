use serde::{Deserialize, Serialize};
use std::fmt;

/// A stored API key with its user-facing label.
///
/// The key is opaque: only its last four characters are ever displayed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub key: String,
    #[serde(default)]
    pub label: String,
}

impl CredentialRecord {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }

    /// Masked key for display (SECURITY: never expose full key)
    ///
    /// "sk-or-v1-1234567890abcdef" → "••••cdef"
    pub fn masked_key(&self) -> String {
        let count = self.key.chars().count();
        let suffix: String = self.key.chars().skip(count.saturating_sub(4)).collect();
        format!("••••{}", suffix)
    }
}

// Debug output ends up in logs; keep the secret out of it.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("key", &self.masked_key())
            .field("label", &self.label)
            .finish()
    }
}
