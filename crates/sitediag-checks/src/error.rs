//! Error types for building the built-in modules.

use sitediag_core::RegistryError;
use thiserror::Error;

pub type ChecksResult<T> = std::result::Result<T, ChecksError>;

#[derive(Debug, Error)]
pub enum ChecksError {
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid {option} pattern for module {module}: {source}")]
    InvalidPattern {
        module: &'static str,
        option: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_display() {
        let source = regex::Regex::new("(").unwrap_err();
        let err = ChecksError::InvalidPattern {
            module: "storage",
            option: "sensitiveKeyPattern",
            source,
        };
        let msg = err.to_string();
        assert!(msg.contains("storage"));
        assert!(msg.contains("sensitiveKeyPattern"));
    }

    #[test]
    fn test_registry_error_is_transparent() {
        let err: ChecksError = RegistryError::DuplicateModule("seo".into()).into();
        assert_eq!(err.to_string(), RegistryError::DuplicateModule("seo".into()).to_string());
    }
}
