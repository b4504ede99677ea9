use ark_noid::ark::validate_naan;
use ark_noid::{AlphabetKind, LookupSettings, Minter, MinterConfig, RandomizedMinter, SequentialMinter};
use serde::Deserialize;
use tokio::sync::oneshot;

use crate::config::default_true;
use crate::error::AllocationError;
use crate::store::NamespaceRecord;

/// A request to allocate a namespace, as submitted by a caller or read from
/// a `[[namespace]]` config block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MintNamespaceRequest {
    /// Namespace label.
    pub namespace: String,
    /// Alphabet kind name (case-insensitive, `-` or `_`).
    #[serde(alias = "alphabet_kind")]
    pub alphabet: String,
    /// Bare identifier length.
    pub length: usize,
    /// Optional prefix for every identifier.
    #[serde(default)]
    pub shoulder: Option<String>,
    /// Append a check character (default: true).
    #[serde(default = "default_true", alias = "checksums_required")]
    pub checksums: bool,
    /// Mint in pseudo-random order from a lookup file.
    #[serde(default)]
    pub randomized: bool,
    /// Store identifiers as `ark:/{naan}/{noid}`.
    #[serde(default)]
    pub naan: Option<String>,
}

impl MintNamespaceRequest {
    /// Check the parts of the request the minter does not check itself.
    pub fn validate(&self) -> Result<AlphabetKind, AllocationError> {
        if self.namespace.trim().is_empty() {
            return Err(AllocationError::InvalidRequest(
                "namespace must not be empty".to_string(),
            ));
        }
        if let Some(naan) = &self.naan {
            validate_naan(naan).map_err(|e| AllocationError::InvalidRequest(e.to_string()))?;
        }
        Ok(self.alphabet.parse::<AlphabetKind>()?)
    }

    /// Build the minter this request describes.
    ///
    /// A randomized request may build its lookup file, so call this off the
    /// async executor.
    pub fn build_minter(&self, settings: &LookupSettings) -> Result<Minter, AllocationError> {
        let kind = self.validate()?;
        let config = MinterConfig::new(self.namespace.clone(), kind, self.length)
            .with_shoulder(self.shoulder.clone())
            .with_checksums(self.checksums);

        let minter = if self.randomized {
            RandomizedMinter::new(config, settings)?.into()
        } else {
            SequentialMinter::new(config)?.into()
        };
        Ok(minter)
    }
}

/// Events handled by the allocator worker.
#[derive(Debug)]
pub enum AllocatorEvent {
    /// Drain a minter into a new namespace.
    MintNamespace {
        minter: Box<Minter>,
        naan: Option<String>,
        reply_tx: oneshot::Sender<Result<NamespaceRecord, AllocationError>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(toml: &str) -> MintNamespaceRequest {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn test_defaults() {
        let req = request(
            r#"
namespace = "books"
alphabet = "alphanumeric"
length = 6
"#,
        );
        assert!(req.checksums);
        assert!(!req.randomized);
        assert_eq!(req.shoulder, None);
        assert_eq!(req.validate().unwrap(), AlphabetKind::Alphanumeric);
    }

    #[test]
    fn test_wire_field_names() {
        let req = request(
            r#"
namespace = "maps"
alphabet_kind = "ALPHA_ALL"
length = 3
checksums_required = false
"#,
        );
        assert!(!req.checksums);
        assert_eq!(req.validate().unwrap(), AlphabetKind::AlphaAll);
    }

    #[test]
    fn test_invalid_requests() {
        let mut req = request(
            r#"
namespace = " "
alphabet = "numeric"
length = 2
"#,
        );
        assert!(matches!(req.validate(), Err(AllocationError::InvalidRequest(_))));

        req.namespace = "ok".to_string();
        req.naan = Some("12/34".to_string());
        assert!(matches!(req.validate(), Err(AllocationError::InvalidRequest(_))));

        req.naan = None;
        req.alphabet = "hex".to_string();
        let err = req.validate().unwrap_err();
        assert_eq!(err.error_code(), "invalid_minter");
    }

    #[test]
    fn test_build_sequential_minter() {
        let req = request(
            r#"
namespace = "seq"
alphabet = "numeric"
length = 2
shoulder = "12"
"#,
        );
        let dir = tempfile::tempdir().unwrap();
        let mut minter = req.build_minter(&LookupSettings::new(dir.path())).unwrap();
        assert!(!minter.is_randomized());
        assert_eq!(minter.next_noid().unwrap(), "12005");
    }
}
