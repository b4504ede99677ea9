//! Error types for NOID minting.
//!
//! Configuration problems (`UnknownAlphabetKind`, `InvalidLength`,
//! `SpaceTooLarge`, `ArithmeticOverflow`) are raised when a minter is
//! built. `Exhausted` is the normal terminal condition of every minter.
//! `UnknownCharacter` and `LookupIo` are raised while minting or validating.
//! `InconsistentState` rejects a decoded minter no constructor could produce.

use std::path::PathBuf;

use thiserror::Error;

use crate::alphabet::AlphabetKind;

/// Convenience type alias for Results using [`NoidError`].
pub type Result<T, E = NoidError> = std::result::Result<T, E>;

/// Errors raised by the alphabet catalog, checksum engine and minters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NoidError {
    /// The alphabet name is not one of the supported kinds.
    #[error("unknown alphabet kind: {0}")]
    UnknownAlphabetKind(String),

    /// NOID length outside `1..=127`.
    #[error("invalid NOID length {0}: must be between 1 and {max}", max = crate::MAX_LENGTH)]
    InvalidLength(usize),

    /// The identifier space is larger than a randomized minter will index.
    #[error("{kind}-{length} space is too large to randomize (limit {max})")]
    SpaceTooLarge {
        /// Alphabet of the rejected space.
        kind: AlphabetKind,
        /// NOID length of the rejected space.
        length: usize,
        /// Configured ceiling.
        max: u64,
    },

    /// `base^length` does not fit in 64 bits.
    #[error("{kind}-{length} identifier count overflows a 64-bit integer")]
    ArithmeticOverflow {
        /// Alphabet of the space.
        kind: AlphabetKind,
        /// NOID length of the space.
        length: usize,
    },

    /// A character is not part of the alphabet used for checksum arithmetic.
    #[error("character {character:?} is not in the {kind} alphabet")]
    UnknownCharacter {
        /// Offending character.
        character: char,
        /// Alphabet the character was looked up in.
        kind: AlphabetKind,
    },

    /// The minter has produced every identifier in its space.
    #[error("minter is exhausted")]
    Exhausted,

    /// A direct lookup asked for a position past the end of the space.
    #[error("index {index} is outside the identifier space of {total}")]
    IndexOutOfRange {
        /// Requested position.
        index: u64,
        /// Number of identifiers in the space.
        total: u64,
    },

    /// Decoded minter state that violates the minter's invariants.
    #[error("inconsistent minter state: {0}")]
    InconsistentState(String),

    /// The shared lookup file is missing, truncated or unreadable.
    #[error("lookup file {}: {source}", path.display())]
    LookupIo {
        /// Path of the lookup file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl NoidError {
    /// Wrap an I/O error raised while touching the lookup file at `path`.
    pub(crate) fn lookup(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LookupIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn inconsistent(detail: impl Into<String>) -> Self {
        Self::InconsistentState(detail.into())
    }

    /// Whether this error was raised while building or validating a minter.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownAlphabetKind(_)
                | Self::InvalidLength(_)
                | Self::SpaceTooLarge { .. }
                | Self::ArithmeticOverflow { .. }
        )
    }
}
