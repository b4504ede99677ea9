//! Ascending, resumable enumeration of every identifier in a space.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::MinterConfig;
use crate::alphabet::AlphabetKind;
use crate::error::{NoidError, Result};

/// Marker stored in the overflow slot once the odometer has rolled over.
const OVERFLOW: u8 = 1;

/// An odometer over the alphabet's digit values.
///
/// `carry` holds the least significant digit first and has two spare slots
/// past the last digit. Slot `length` is the overflow flag: once set, the
/// minter is exhausted. `digits` is the value last emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SequentialState")]
pub struct SequentialMinter {
    config: MinterConfig,
    digits: Vec<u8>,
    carry: Vec<u8>,
    index: u64,
}

/// Serialized form of a [`SequentialMinter`], checked before it is used.
#[derive(Deserialize)]
struct SequentialState {
    config: MinterConfig,
    digits: Vec<u8>,
    carry: Vec<u8>,
    index: u64,
}

impl TryFrom<SequentialState> for SequentialMinter {
    type Error = NoidError;

    fn try_from(state: SequentialState) -> Result<Self> {
        state.config.check()?;

        let length = state.config.length();
        let base = state.config.alphabet().base();

        if state.digits.len() != length || state.carry.len() != length + 2 {
            return Err(NoidError::inconsistent(format!(
                "odometer widths {}/{} do not fit length {length}",
                state.digits.len(),
                state.carry.len()
            )));
        }

        let out_of_base = state
            .digits
            .iter()
            .chain(&state.carry[..length])
            .find(|&&digit| usize::from(digit) >= base);
        if let Some(digit) = out_of_base {
            return Err(NoidError::inconsistent(format!(
                "digit value {digit} is outside base {base}"
            )));
        }

        let overflowed = match state.carry[length] {
            0 => false,
            OVERFLOW => true,
            flag => {
                return Err(NoidError::inconsistent(format!("overflow flag {flag}")));
            }
        };
        if state.carry[length + 1] != 0 {
            return Err(NoidError::inconsistent("spare carry slot is set"));
        }

        if let Ok(size) = state.config.alphabet().count(length) {
            if state.index > size || (state.index == size) != overflowed {
                return Err(NoidError::inconsistent(format!(
                    "index {} does not match a space of {size}",
                    state.index
                )));
            }
        }

        Ok(Self {
            config: state.config,
            digits: state.digits,
            carry: state.carry,
            index: state.index,
        })
    }
}

impl SequentialMinter {
    /// Create a minter positioned before the all-zero identifier.
    pub fn new(config: MinterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::at_start(config))
    }

    /// A minter of bare identifiers (no shoulder, no check character).
    pub(crate) fn bare(alphabet: AlphabetKind, length: usize) -> Result<Self> {
        Self::new(MinterConfig::new(String::new(), alphabet, length).with_checksums(false))
    }

    fn at_start(config: MinterConfig) -> Self {
        let length = config.length();
        Self {
            config,
            digits: vec![0; length],
            carry: vec![0; length + 2],
            index: 0,
        }
    }

    /// The minter's configuration.
    pub fn config(&self) -> &MinterConfig {
        &self.config
    }

    /// Whether another identifier can be minted.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.carry[self.config.length()] != OVERFLOW
    }

    /// Mint the next identifier in ascending order.
    pub fn next_noid(&mut self) -> Result<String> {
        self.advance()?;
        let mut bare = vec![0; self.config.length()];
        self.render_into(&mut bare);
        // Alphabet characters are ASCII.
        let bare = String::from_utf8_lossy(&bare);
        self.config.finish(&bare)
    }

    /// Mint up to `count` identifiers, stopping early once exhausted.
    pub fn next_batch(&mut self, count: usize) -> Result<Vec<String>> {
        let mut noids = Vec::with_capacity(count.min(self.remaining_hint()));
        while noids.len() < count && self.has_next() {
            noids.push(self.next_noid()?);
        }
        Ok(noids)
    }

    /// Write the next bare identifier into `out` (exactly `length` bytes).
    pub(crate) fn next_bare_into(&mut self, out: &mut [u8]) -> Result<()> {
        self.advance()?;
        self.render_into(out);
        Ok(())
    }

    /// Total capacity, `base^length`.
    pub fn size(&self) -> Result<u64> {
        self.config.alphabet().count(self.config.length())
    }

    /// Number of identifiers minted so far.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Capture the current value, then step the odometer.
    fn advance(&mut self) -> Result<()> {
        if !self.has_next() {
            return Err(NoidError::Exhausted);
        }

        let length = self.config.length();
        let top = (self.config.alphabet().base() - 1) as u8;

        self.index += 1;
        self.digits.copy_from_slice(&self.carry[..length]);

        let mut position = 0;
        while position < self.carry.len() && self.carry[position] == top {
            self.carry[position] = 0;
            position += 1;
        }

        if position == self.carry.len() {
            self.carry[length] = OVERFLOW;
        } else {
            self.carry[position] += 1;
        }

        Ok(())
    }

    /// Render `digits` most significant first, so mint order sorts ascending.
    fn render_into(&self, out: &mut [u8]) {
        let characters = self.config.alphabet().characters();
        for (slot, &digit) in out.iter_mut().zip(self.digits.iter().rev()) {
            *slot = characters[digit as usize];
        }
    }

    fn remaining_hint(&self) -> usize {
        self.size()
            .ok()
            .and_then(|size| usize::try_from(size.saturating_sub(self.index)).ok())
            .unwrap_or(usize::MAX)
    }
}

impl fmt::Display for SequentialMinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let characters = self.config.alphabet().characters();
        write!(f, "SequentialMinter=[#{}, [", self.index)?;
        for (i, &digit) in self.digits.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", characters[digit as usize] as char)?;
        }
        f.write_str("], bits: ")?;
        for digit in &self.carry {
            write!(f, "{digit}")?;
        }
        f.write_str("]")
    }
}
