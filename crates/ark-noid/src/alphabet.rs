//! Alphabet catalog.
//!
//! Each [`AlphabetKind`] names a fixed, ordered character set. The position
//! of a character in its set is its digit value, which both enumeration and
//! checksum arithmetic depend on. The tables below must never be reordered:
//! doing so invalidates every issued checksum and every lookup file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NoidError, Result};

/// Decimal digits (10).
const NUMERIC_CHARS: &str = "0123456789";

/// Lowercase letters without `l`, which reads too much like `1` (25).
const ALPHA_LC_CHARS: &str = "abcdefghijkmnopqrstuvwxyz";

/// Uppercase letters (26).
const ALPHA_UC_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

const ALPHA_ALL_CHARS: &str = concat!(
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "abcdefghijkmnopqrstuvwxyz"
);

const ALPHANUMERIC_CHARS: &str = concat!("0123456789", "abcdefghijkmnopqrstuvwxyz");

const ALPHANUMERIC_ALL_CHARS: &str = concat!(
    "0123456789",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "abcdefghijkmnopqrstuvwxyz"
);

/// The character sets a minter can draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlphabetKind {
    /// `0-9`
    Numeric,
    /// `a-z` without `l`
    Alpha,
    /// `A-Z` then `a-z` without `l`
    AlphaAll,
    /// `0-9` then `a-z` without `l`
    Alphanumeric,
    /// `0-9`, `A-Z`, then `a-z` without `l`
    AlphanumericAll,
    /// Alias of [`AlphabetKind::Alphanumeric`]'s character set.
    RegexPattern,
    /// Alias of [`AlphabetKind::AlphanumericAll`]'s character set.
    RegexPatternAll,
}

impl AlphabetKind {
    /// Every kind, in declaration order.
    pub const ALL: [AlphabetKind; 7] = [
        Self::Numeric,
        Self::Alpha,
        Self::AlphaAll,
        Self::Alphanumeric,
        Self::AlphanumericAll,
        Self::RegexPattern,
        Self::RegexPatternAll,
    ];

    /// The ordered characters of this alphabet, as ASCII bytes.
    #[inline]
    pub const fn characters(self) -> &'static [u8] {
        self.as_chars().as_bytes()
    }

    /// The ordered characters of this alphabet, as a string.
    #[inline]
    pub const fn as_chars(self) -> &'static str {
        match self {
            Self::Numeric => NUMERIC_CHARS,
            Self::Alpha => ALPHA_LC_CHARS,
            Self::AlphaAll => ALPHA_ALL_CHARS,
            Self::Alphanumeric | Self::RegexPattern => ALPHANUMERIC_CHARS,
            Self::AlphanumericAll | Self::RegexPatternAll => ALPHANUMERIC_ALL_CHARS,
        }
    }

    /// Number of characters (the numeric base used for enumeration).
    #[inline]
    pub const fn base(self) -> usize {
        self.characters().len()
    }

    /// Number of distinct bare identifiers of `length` characters.
    ///
    /// Fails with [`NoidError::ArithmeticOverflow`] when `base^length`
    /// does not fit in a `u64`.
    pub fn count(self, length: usize) -> Result<u64> {
        u32::try_from(length)
            .ok()
            .and_then(|exp| (self.base() as u64).checked_pow(exp))
            .ok_or(NoidError::ArithmeticOverflow { kind: self, length })
    }

    /// Digit value of `character`, if it belongs to this alphabet.
    #[inline]
    pub fn position(self, character: char) -> Option<usize> {
        if !character.is_ascii() {
            return None;
        }
        let byte = character as u8;
        self.characters().iter().position(|&c| c == byte)
    }

    /// Whether every character of `text` belongs to this alphabet.
    pub fn contains_all(self, text: &str) -> bool {
        text.chars().all(|c| self.position(c).is_some())
    }

    /// Canonical upper-case name, as used in lookup file names.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Numeric => "NUMERIC",
            Self::Alpha => "ALPHA",
            Self::AlphaAll => "ALPHA_ALL",
            Self::Alphanumeric => "ALPHANUMERIC",
            Self::AlphanumericAll => "ALPHANUMERIC_ALL",
            Self::RegexPattern => "REGEX_PATTERN",
            Self::RegexPatternAll => "REGEX_PATTERN_ALL",
        }
    }
}

impl fmt::Display for AlphabetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlphabetKind {
    type Err = NoidError;

    /// Case-insensitive; `-` and `_` are interchangeable.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(NoidError::UnknownAlphabetKind("(null)".to_string()));
        }

        let normalized = trimmed.to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| NoidError::UnknownAlphabetKind(s.to_string()))
    }
}
