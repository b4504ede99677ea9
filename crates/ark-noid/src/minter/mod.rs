//! NOID minters.
//!
//! Two variants share one configuration ([`MinterConfig`]) and one finishing
//! step (shoulder prefix, optional check character):
//!
//! - [`SequentialMinter`]: an odometer over the alphabet that emits every
//!   identifier exactly once in ascending order.
//! - [`RandomizedMinter`]: visits the same space in a full-period
//!   pseudo-random order, reading bare identifiers from a shared lookup file.
//!
//! Both are plain data and serialize with serde, so a minter can be handed to
//! another task or process and resumed there (see [`crate::codec`]).

mod randomized;
mod sequential;

pub use randomized::RandomizedMinter;
pub use sequential::SequentialMinter;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::alphabet::AlphabetKind;
use crate::checksum;
use crate::error::{NoidError, Result};
use crate::MAX_LENGTH;

/// Settings shared by every minter variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinterConfig {
    namespace: String,
    alphabet: AlphabetKind,
    length: usize,
    shoulder: Option<String>,
    checksums: bool,
}

impl MinterConfig {
    /// Create a configuration with no shoulder and check characters enabled.
    pub fn new(namespace: impl Into<String>, alphabet: AlphabetKind, length: usize) -> Self {
        Self {
            namespace: namespace.into(),
            alphabet,
            length,
            shoulder: None,
            checksums: true,
        }
    }

    /// Set the prefix prepended to every identifier. Empty means none.
    pub fn with_shoulder(mut self, shoulder: Option<String>) -> Self {
        self.shoulder = shoulder.filter(|s| !s.is_empty());
        self
    }

    /// Enable or disable the trailing check character.
    pub fn with_checksums(mut self, checksums: bool) -> Self {
        self.checksums = checksums;
        self
    }

    /// Namespace the minted identifiers belong to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Alphabet used for enumeration and checksums.
    pub fn alphabet(&self) -> AlphabetKind {
        self.alphabet
    }

    /// Length of the bare identifier (without shoulder or check character).
    pub fn length(&self) -> usize {
        self.length
    }

    /// Prefix prepended to every identifier.
    pub fn shoulder(&self) -> Option<&str> {
        self.shoulder.as_deref()
    }

    /// Whether a check character is appended.
    pub fn checksums(&self) -> bool {
        self.checksums
    }

    /// Reject lengths outside `1..=127` and shoulders the checksum cannot
    /// cover; warn about shoulders that break the first-digit convention.
    pub(crate) fn validate(&self) -> Result<()> {
        self.check()?;

        if let Some(shoulder) = self.shoulder.as_deref() {
            if !follows_first_digit_convention(shoulder) {
                warn!(
                    namespace = %self.namespace,
                    shoulder = %shoulder,
                    "Shoulder does not follow the first-digit convention (letters then one digit)"
                );
            }
        }
        Ok(())
    }

    /// The error half of [`validate`](Self::validate), without logging.
    pub(crate) fn check(&self) -> Result<()> {
        if self.length == 0 || self.length > MAX_LENGTH {
            return Err(NoidError::InvalidLength(self.length));
        }

        if let Some(shoulder) = self.shoulder.as_deref() {
            if self.checksums {
                let foreign = shoulder
                    .chars()
                    .find(|&c| self.alphabet.position(c).is_none());
                if let Some(character) = foreign {
                    return Err(NoidError::UnknownCharacter {
                        character,
                        kind: self.alphabet,
                    });
                }
            }
        }

        Ok(())
    }

    /// Turn a bare identifier into a finished one.
    pub(crate) fn finish(&self, bare: &str) -> Result<String> {
        let mut noid = match self.shoulder.as_deref() {
            Some(shoulder) => {
                let mut noid = String::with_capacity(shoulder.len() + bare.len() + 1);
                noid.push_str(shoulder);
                noid.push_str(bare);
                noid
            }
            None => bare.to_string(),
        };

        if self.checksums {
            let check = checksum::checksum_char(&noid, self.alphabet)?;
            noid.push(check);
        }

        Ok(noid)
    }
}

/// `^[a-zA-Z]+[0-9]$`
fn follows_first_digit_convention(shoulder: &str) -> bool {
    match shoulder.as_bytes().split_last() {
        Some((last, letters)) => {
            last.is_ascii_digit()
                && !letters.is_empty()
                && letters.iter().all(u8::is_ascii_alphabetic)
        }
        None => false,
    }
}

/// Either minter variant.
#[derive(Debug, Serialize, Deserialize)]
pub enum Minter {
    /// Ascending enumeration.
    Sequential(SequentialMinter),
    /// Pseudo-random full-coverage enumeration.
    Randomized(RandomizedMinter),
}

impl Minter {
    /// The shared configuration.
    pub fn config(&self) -> &MinterConfig {
        match self {
            Self::Sequential(m) => m.config(),
            Self::Randomized(m) => m.config(),
        }
    }

    /// Namespace the minted identifiers belong to.
    pub fn namespace(&self) -> &str {
        self.config().namespace()
    }

    /// Whether another identifier can be minted.
    pub fn has_next(&self) -> bool {
        match self {
            Self::Sequential(m) => m.has_next(),
            Self::Randomized(m) => m.has_next(),
        }
    }

    /// Mint the next identifier, failing with [`NoidError::Exhausted`] once
    /// the space is used up.
    pub fn next_noid(&mut self) -> Result<String> {
        match self {
            Self::Sequential(m) => m.next_noid(),
            Self::Randomized(m) => m.next_noid(),
        }
    }

    /// Mint up to `count` identifiers. Returns fewer when the space runs out.
    pub fn next_batch(&mut self, count: usize) -> Result<Vec<String>> {
        match self {
            Self::Sequential(m) => m.next_batch(count),
            Self::Randomized(m) => m.next_batch(count),
        }
    }

    /// Total number of identifiers in this minter's space.
    pub fn size(&self) -> Result<u64> {
        match self {
            Self::Sequential(m) => m.size(),
            Self::Randomized(m) => Ok(m.size()),
        }
    }

    /// Number of identifiers minted so far.
    pub fn emitted(&self) -> u64 {
        match self {
            Self::Sequential(m) => m.index(),
            Self::Randomized(m) => m.emitted(),
        }
    }

    /// Check a finished identifier against this minter's alphabet.
    pub fn validate(&self, noid: &str) -> Result<bool> {
        checksum::validate(noid, self.config().alphabet())
    }

    /// Whether identifiers come out in random order.
    pub fn is_randomized(&self) -> bool {
        matches!(self, Self::Randomized(_))
    }
}

impl Iterator for Minter {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.has_next().then(|| self.next_noid())
    }
}

impl From<SequentialMinter> for Minter {
    fn from(minter: SequentialMinter) -> Self {
        Self::Sequential(minter)
    }
}

impl From<RandomizedMinter> for Minter {
    fn from(minter: RandomizedMinter) -> Self {
        Self::Randomized(minter)
    }
}

impl fmt::Display for Minter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential(m) => m.fmt(f),
            Self::Randomized(m) => m.fmt(f),
        }
    }
}
