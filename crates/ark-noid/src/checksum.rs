//! Luhn mod N check characters.
//!
//! A single trailing character catches most single-character substitutions
//! and adjacent transpositions. Substitutions in undoubled positions (the
//! check character and every second character leftwards from it) are always
//! caught; in doubled positions only even bases such as
//! [`AlphabetKind::Numeric`] catch every one. It is a typo guard, not an
//! integrity guarantee against deliberate tampering.

use crate::alphabet::AlphabetKind;
use crate::error::{NoidError, Result};

/// Compute the check character for `body`.
///
/// Fails with [`NoidError::UnknownCharacter`] if `body` contains a character
/// outside `kind`'s alphabet.
pub fn checksum_char(body: &str, kind: AlphabetKind) -> Result<char> {
    let base = kind.base();
    let sum = weighted_sum(body, kind, 2)?;
    let index = (base - sum % base) % base;
    Ok(kind.characters()[index] as char)
}

/// Return `body` with its check character appended.
pub fn append_checksum(body: &str, kind: AlphabetKind) -> Result<String> {
    let check = checksum_char(body, kind)?;
    let mut noid = String::with_capacity(body.len() + 1);
    noid.push_str(body);
    noid.push(check);
    Ok(noid)
}

/// Check that the last character of `noid` is the correct check character
/// for the rest of it.
///
/// An empty string is never valid.
pub fn validate(noid: &str, kind: AlphabetKind) -> Result<bool> {
    if noid.is_empty() {
        return Ok(false);
    }
    let sum = weighted_sum(noid, kind, 1)?;
    Ok(sum % kind.base() == 0)
}

/// Scan right to left, doubling every other digit value starting with
/// `first_factor`, folding each addend back into a single base-N digit sum.
fn weighted_sum(text: &str, kind: AlphabetKind, first_factor: usize) -> Result<usize> {
    let base = kind.base();
    let mut factor = first_factor;
    let mut sum = 0;

    for character in text.chars().rev() {
        let position = kind
            .position(character)
            .ok_or(NoidError::UnknownCharacter { character, kind })?;
        let addend = factor * position;
        sum += addend / base + addend % base;
        factor = if factor == 2 { 1 } else { 2 };
    }

    Ok(sum)
}
