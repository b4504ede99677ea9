//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::config::StorageBackend;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("storage.path parent directory does not exist: {0}")]
    StoragePathInvalid(String),
    #[error("minting.queue_depth must be at least 1")]
    ZeroQueueDepth,
    #[error("minting.allocation_timeout_secs must be at least 1")]
    ZeroAllocationTimeout,
    #[error("minting.max_space must be at least 1")]
    ZeroMaxSpace,
    #[error("namespace #{0}: name is required")]
    MissingNamespaceName(usize),
    #[error("namespace {0} is declared more than once")]
    DuplicateNamespace(String),
    #[error("namespace {name}: {reason}")]
    InvalidNamespace { name: String, reason: String },
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    // Storage path validation
    if config.storage.backend == StorageBackend::Redb {
        let path = Path::new(&config.storage.path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::StoragePathInvalid(config.storage.path.clone()));
        }
    }

    // Limits
    if config.minting.queue_depth == 0 {
        errors.push(ValidationError::ZeroQueueDepth);
    }
    if config.minting.allocation_timeout_secs == 0 {
        errors.push(ValidationError::ZeroAllocationTimeout);
    }
    if config.minting.max_space == 0 {
        errors.push(ValidationError::ZeroMaxSpace);
    }

    // Namespace blocks
    let mut seen = HashSet::new();
    for (i, request) in config.namespaces.iter().enumerate() {
        if request.namespace.trim().is_empty() {
            errors.push(ValidationError::MissingNamespaceName(i + 1));
            continue;
        }
        if !seen.insert(request.namespace.as_str()) {
            errors.push(ValidationError::DuplicateNamespace(request.namespace.clone()));
        }
        if request.length == 0 || request.length > ark_noid::MAX_LENGTH {
            errors.push(ValidationError::InvalidNamespace {
                name: request.namespace.clone(),
                reason: format!("length must be between 1 and {}", ark_noid::MAX_LENGTH),
            });
        }
        if let Err(e) = request.validate() {
            errors.push(ValidationError::InvalidNamespace {
                name: request.namespace.clone(),
                reason: e.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_valid_config() -> String {
        r#"
[storage]
backend = "memory"

[[namespace]]
namespace = "books"
alphabet = "alphanumeric"
length = 4
"#
        .to_string()
    }

    #[test]
    fn test_valid_config_passes() {
        let config: Config = toml::from_str(&minimal_valid_config()).unwrap();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_storage_parent_fails() {
        let toml = r#"
[storage]
path = "/nonexistent/dir/arkd.redb"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::StoragePathInvalid(_))));
    }

    #[test]
    fn test_zero_limits_fail() {
        let toml = r#"
[minting]
queue_depth = 0
allocation_timeout_secs = 0
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroQueueDepth)));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::ZeroAllocationTimeout)));
    }

    #[test]
    fn test_bad_namespace_blocks_fail() {
        let toml = r#"
[[namespace]]
namespace = "books"
alphabet = "alphanumeric"
length = 4

[[namespace]]
namespace = "books"
alphabet = "hex"
length = 0

[[namespace]]
namespace = ""
alphabet = "numeric"
length = 2
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let errors = validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, ValidationError::DuplicateNamespace(n) if n == "books")));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingNamespaceName(3))));
        assert_eq!(
            errors
                .iter()
                .filter(|e| matches!(e, ValidationError::InvalidNamespace { .. }))
                .count(),
            2
        );
    }
}
