//! Error taxonomy for sitediag.
//!
//! Registry misuse ([`RegistryError`]) is returned to the caller. Module-level
//! failures ([`CollectionError`], [`ScoringError`]) never escape the runner;
//! they are folded into the failed module's [`crate::Report`].

use serde::{Deserialize, Serialize};

/// Why a collector could not produce its snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionCause {
    Network,
    Permission,
    Parse,
    Timeout,
    Cancelled,
}

impl std::fmt::Display for CollectionCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CollectionCause::Network => "network",
            CollectionCause::Permission => "permission",
            CollectionCause::Parse => "parse",
            CollectionCause::Timeout => "timeout",
            CollectionCause::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Failure raised by a collector while gathering environment facts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("collection failed ({cause}): {message}")]
pub struct CollectionError {
    pub cause: CollectionCause,
    pub message: String,
}

impl CollectionError {
    pub fn new(cause: CollectionCause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(CollectionCause::Network, message)
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(CollectionCause::Permission, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(CollectionCause::Parse, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(CollectionCause::Timeout, message)
    }

    pub fn cancelled() -> Self {
        Self::new(CollectionCause::Cancelled, "collection cancelled")
    }

    /// Cancellation must propagate; every other cause may be absorbed into a
    /// degraded snapshot by the collector.
    pub fn is_cancelled(&self) -> bool {
        self.cause == CollectionCause::Cancelled
    }
}

/// Failure raised by a scorer on malformed raw data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("malformed raw data: {0}")]
    Malformed(String),

    #[error("scorer panicked: {0}")]
    Panicked(String),
}

/// A module-level failure: either stage of a module run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModuleError {
    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Registry misuse. These are programming errors and propagate to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("module already registered: {0}")]
    DuplicateModule(String),

    #[error("unknown module: {0}")]
    UnknownModule(String),
}

pub type CollectionResult<T> = std::result::Result<T, CollectionError>;
pub type ScoringResult<T> = std::result::Result<T, ScoringError>;
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_error_display() {
        let err = CollectionError::timeout("HEAD https://example.com timed out after 5000ms");
        let msg = err.to_string();
        assert!(msg.contains("timeout"));
        assert!(msg.contains("5000ms"));
    }

    #[test]
    fn test_cancelled_is_flagged() {
        assert!(CollectionError::cancelled().is_cancelled());
        assert!(!CollectionError::network("refused").is_cancelled());
    }

    #[test]
    fn test_module_error_is_transparent() {
        let err: ModuleError = ScoringError::Malformed("negative byte count".to_string()).into();
        assert_eq!(err.to_string(), "malformed raw data: negative byte count");

        let err: ModuleError = CollectionError::permission("storage blocked").into();
        assert!(err.to_string().contains("permission"));
    }

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::UnknownModule("nonexistent".to_string());
        assert!(err.to_string().contains("unknown module"));
        assert!(err.to_string().contains("nonexistent"));

        let err = RegistryError::DuplicateModule("seo".to_string());
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn test_cause_serializes_snake_case() {
        let v = serde_json::to_value(CollectionCause::Timeout).unwrap();
        assert_eq!(v, serde_json::json!("timeout"));
    }
}
