//! Archival Resource Keys.
//!
//! An ARK names an object as `ark:/{naan}/{name}`, where the NAAN (Name
//! Assigning Authority Number) identifies the issuing organisation and the
//! name is a minted NOID, usually carrying a shoulder and check character.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheme label, with the slash form used when formatting.
pub const ARK_PREFIX: &str = "ark:/";

/// Errors raised while building or parsing an ARK.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArkError {
    /// The text does not start with `ark:`.
    #[error("missing ark: scheme in {0:?}")]
    MissingScheme(String),

    /// The NAAN is empty or not ASCII alphanumeric.
    #[error("invalid NAAN {0:?}: must be non-empty ASCII alphanumeric")]
    InvalidNaan(String),

    /// Nothing follows the NAAN.
    #[error("ARK {0:?} has no name")]
    MissingName(String),
}

/// A NAAN-qualified identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ark {
    naan: String,
    name: String,
}

impl Ark {
    /// Qualify `name` with `naan`.
    pub fn new(naan: impl Into<String>, name: impl Into<String>) -> Result<Self, ArkError> {
        let naan = naan.into();
        validate_naan(&naan)?;
        let name = name.into();
        if name.is_empty() {
            return Err(ArkError::MissingName(format!("{ARK_PREFIX}{naan}/")));
        }
        Ok(Self { naan, name })
    }

    /// The issuing authority's number.
    pub fn naan(&self) -> &str {
        &self.naan
    }

    /// The identifier within the NAAN.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Check that `naan` is non-empty ASCII alphanumeric.
pub fn validate_naan(naan: &str) -> Result<(), ArkError> {
    if naan.is_empty() || !naan.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ArkError::InvalidNaan(naan.to_string()));
    }
    Ok(())
}

impl fmt::Display for Ark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ARK_PREFIX}{}/{}", self.naan, self.name)
    }
}

impl FromStr for Ark {
    type Err = ArkError;

    /// Accepts both `ark:/naan/name` and `ark:naan/name`.
    fn from_str(s: &str) -> Result<Self, ArkError> {
        let rest = s
            .strip_prefix(ARK_PREFIX)
            .or_else(|| s.strip_prefix("ark:"))
            .ok_or_else(|| ArkError::MissingScheme(s.to_string()))?;

        match rest.split_once('/') {
            Some((naan, name)) => Self::new(naan, name),
            None => {
                validate_naan(rest)?;
                Err(ArkError::MissingName(s.to_string()))
            }
        }
    }
}
