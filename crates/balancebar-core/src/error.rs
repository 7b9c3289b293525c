//! Error types for balancebar-core
//!
//! Every engine failure is one of these variants. A failed operation never
//! leaves partial state behind.

use std::fmt;
use thiserror::Error;

/// Core error type for balancebar operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    // ===================
    // Credential Errors
    // ===================
    /// Malformed API key, the user corrects the input
    #[error("Invalid key format: {reason}")]
    Validation { reason: KeyFormatIssue },

    /// Caller passed an index that does not exist
    #[error("Credential index {index} out of range ({len} configured)")]
    OutOfRange { index: usize, len: usize },

    /// Operation would break a credential set invariant
    #[error("{message}")]
    InvariantViolation { message: String },

    #[error("No active API key configured")]
    NoActiveCredential,

    // ===================
    // Upstream Errors
    // ===================
    /// Balance fetch failure, message passed through verbatim
    #[error("{message}")]
    Upstream { message: String },
}

impl CoreError {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Whether the user can fix this without a code change
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::OutOfRange { .. })
    }

    /// Actionable hint to show next to the message
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Validation { .. } => {
                Some("OpenRouter keys start with 'sk-' and are at least 20 characters long")
            }
            Self::InvariantViolation { .. } => Some("Add another API key before deleting this one"),
            Self::NoActiveCredential => Some("Add an API key in settings"),
            Self::Upstream { .. } | Self::OutOfRange { .. } => None,
        }
    }
}

/// Why a key failed format validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormatIssue {
    Empty,
    MissingPrefix,
    TooShort,
}

impl fmt::Display for KeyFormatIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Empty => "API key cannot be empty",
            Self::MissingPrefix => "API key must start with 'sk-'",
            Self::TooShort => "API key is too short",
        };
        f.write_str(message)
    }
}

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = CoreError::Validation {
            reason: KeyFormatIssue::MissingPrefix,
        };
        assert_eq!(
            err.to_string(),
            "Invalid key format: API key must start with 'sk-'"
        );

        let err = CoreError::upstream("Invalid API key. Please check your key and try again.");
        assert_eq!(
            err.to_string(),
            "Invalid API key. Please check your key and try again."
        );
    }

    #[test]
    fn test_recoverability() {
        assert!(!CoreError::OutOfRange { index: 3, len: 2 }.is_recoverable());
        assert!(CoreError::upstream("timeout").is_recoverable());
        assert!(CoreError::NoActiveCredential.suggestion().is_some());
    }
}
