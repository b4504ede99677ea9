//! # ark-noid
//!
//! Minting of NOIDs: fixed-length identifiers over a fixed alphabet,
//! optionally prefixed with a shoulder and suffixed with a Luhn-mod-N check
//! character.
//!
//! ## Features
//!
//! - Alphabet catalog with load-bearing character order
//! - Check character computation and validation
//! - Sequential minting in ascending order, resumable from serialized state
//! - Randomized full-coverage minting backed by a shared lookup file (NAF)
//! - ARK formatting and parsing
//! - Optional Tokio codec for shipping minters between tasks or processes
//!
//! ## Quick Start
//!
//! ```rust
//! use ark_noid::{checksum, AlphabetKind, Minter, MinterConfig, SequentialMinter};
//!
//! let config = MinterConfig::new("docs", AlphabetKind::Alphanumeric, 4)
//!     .with_shoulder(Some("b5".to_string()));
//! let mut minter: Minter = SequentialMinter::new(config).unwrap().into();
//!
//! let noid = minter.next_noid().unwrap();
//! assert!(noid.starts_with("b50000"));
//! assert!(checksum::validate(&noid, AlphabetKind::Alphanumeric).unwrap());
//! ```

#![deny(clippy::all)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod alphabet;
pub mod ark;
pub mod checksum;
pub mod codec;
pub mod error;
pub mod minter;
pub mod naf;

pub use self::alphabet::AlphabetKind;
pub use self::ark::{Ark, ArkError};
#[cfg(feature = "tokio")]
pub use self::codec::MinterCodec;
pub use self::codec::{decode_minter, encode_minter, CodecError};
pub use self::error::{NoidError, Result};
pub use self::minter::{Minter, MinterConfig, RandomizedMinter, SequentialMinter};
pub use self::naf::{LookupFile, LookupSettings};

/// Longest bare identifier a minter accepts.
pub const MAX_LENGTH: usize = 127;
