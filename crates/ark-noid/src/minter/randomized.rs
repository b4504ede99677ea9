//! Pseudo-random, non-repeating enumeration backed by a lookup file.
//!
//! Positions are drawn from a linear congruential generator over a
//! power-of-two modulus `m >= total`. With an odd increment and a multiplier
//! `≡ 1 (mod 4)` the generator has full period (Hull–Dobell), so every
//! residue in `[0, m)` comes up exactly once per cycle. Residues `>= total`
//! are skipped. Since `m < 2 * total`, a single mint takes fewer than
//! `total` skips and two generator steps on average.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::MinterConfig;
use crate::error::{NoidError, Result};
use crate::naf::{LookupFile, LookupSettings};

/// LCG multiplier (`a`).
const MULTIPLIER: u64 = 1_664_525;

/// LCG increment (`c`).
const INCREMENT: u64 = 1_013_904_223;

/// Randomized minter state.
///
/// Serializes without the lookup file's OS handle; a deserialized minter
/// reopens the file on its next read.
#[derive(Debug, Serialize, Deserialize)]
#[serde(try_from = "RandomizedState")]
pub struct RandomizedMinter {
    config: MinterConfig,
    total: u64,
    modulus: u64,
    seed: u64,
    index: u64,
    emitted: u64,
    done: bool,
    naf: LookupFile,
}

impl RandomizedMinter {
    /// Create a minter with a random starting position, building the shared
    /// lookup file for the space if it does not exist yet.
    pub fn new(config: MinterConfig, settings: &LookupSettings) -> Result<Self> {
        Self::open(config, settings, |total| rand::thread_rng().gen_range(0..total))
    }

    /// Create a minter that starts from `seed` (reduced modulo the space size).
    pub fn with_seed(config: MinterConfig, settings: &LookupSettings, seed: u64) -> Result<Self> {
        Self::open(config, settings, |total| seed % total)
    }

    fn open(
        config: MinterConfig,
        settings: &LookupSettings,
        seed: impl FnOnce(u64) -> u64,
    ) -> Result<Self> {
        let total = Self::check_space(&config, settings)?;
        let modulus = total.next_power_of_two();
        let naf = LookupFile::open_or_build(settings, config.alphabet(), config.length())?;
        let seed = seed(total);

        Ok(Self {
            config,
            total,
            modulus,
            seed,
            index: seed,
            emitted: 0,
            done: false,
            naf,
        })
    }

    /// Validate the configuration and return the size of its space.
    fn check_space(config: &MinterConfig, settings: &LookupSettings) -> Result<u64> {
        config.validate()?;

        let too_large = || NoidError::SpaceTooLarge {
            kind: config.alphabet(),
            length: config.length(),
            max: settings.max_space,
        };

        let total = config
            .alphabet()
            .count(config.length())
            .map_err(|_| too_large())?;

        if total == 0 || total > settings.max_space {
            return Err(too_large());
        }
        Ok(total)
    }

    /// The minter's configuration.
    pub fn config(&self) -> &MinterConfig {
        &self.config
    }

    /// Whether another identifier can be minted in this cycle.
    #[inline]
    pub fn has_next(&self) -> bool {
        !self.done
    }

    /// Mint the identifier at the next pseudo-random position.
    pub fn next_noid(&mut self) -> Result<String> {
        if self.done {
            return Err(NoidError::Exhausted);
        }

        let mut index = self.step(self.index);
        while index >= self.total {
            index = self.step(index);
        }

        self.index = index;
        self.emitted += 1;
        if index == self.seed {
            self.done = true;
        }

        let bare = self.naf.read(index)?;
        self.config.finish(&bare)
    }

    /// Mint up to `count` identifiers, stopping early once exhausted.
    pub fn next_batch(&mut self, count: usize) -> Result<Vec<String>> {
        let mut noids = Vec::with_capacity(count.min(1 << 16));
        while noids.len() < count && self.has_next() {
            noids.push(self.next_noid()?);
        }
        Ok(noids)
    }

    /// The finished identifier at lookup file position `index`, bypassing
    /// the random cursor.
    pub fn get_noid(&mut self, index: u64) -> Result<String> {
        let bare = self.naf.read(index)?;
        self.config.finish(&bare)
    }

    /// Number of identifiers in the space.
    pub fn size(&self) -> u64 {
        self.total
    }

    /// Current cursor position in the lookup file.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Number of identifiers minted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// The starting (and final) position of the cycle.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The shared lookup file this minter reads from.
    pub fn lookup_file(&self) -> &LookupFile {
        &self.naf
    }

    #[inline]
    fn step(&self, index: u64) -> u64 {
        // `modulus` is a power of two, so wrapping arithmetic reduces exactly.
        index.wrapping_mul(MULTIPLIER).wrapping_add(INCREMENT) & (self.modulus - 1)
    }
}

/// Serialized form of a [`RandomizedMinter`], checked before it is used.
#[derive(Deserialize)]
struct RandomizedState {
    config: MinterConfig,
    total: u64,
    modulus: u64,
    seed: u64,
    index: u64,
    emitted: u64,
    done: bool,
    naf: LookupFile,
}

impl TryFrom<RandomizedState> for RandomizedMinter {
    type Error = NoidError;

    fn try_from(state: RandomizedState) -> Result<Self> {
        state.config.check()?;

        let length = state.config.length();
        let total = state.config.alphabet().count(length)?;

        if state.total != total {
            return Err(NoidError::inconsistent(format!(
                "space of {} identifiers, expected {total}",
                state.total
            )));
        }
        if state.modulus != total.next_power_of_two() {
            return Err(NoidError::inconsistent(format!(
                "modulus {} for a space of {total}",
                state.modulus
            )));
        }
        if state.seed >= total || state.index >= total {
            return Err(NoidError::inconsistent(format!(
                "cursor {}/{} outside a space of {total}",
                state.seed, state.index
            )));
        }
        if state.naf.total() != total || state.naf.length() != length {
            return Err(NoidError::inconsistent(format!(
                "lookup file {} does not hold {total} records of length {length}",
                state.naf.path().display()
            )));
        }

        // `done` is set exactly when the cursor returns to the seed, which
        // takes `total` mints.
        let at_seed = state.index == state.seed;
        let consistent = if state.done {
            at_seed && state.emitted == total
        } else {
            state.emitted < total && (state.emitted == 0) == at_seed
        };
        if !consistent {
            return Err(NoidError::inconsistent(format!(
                "{} of {total} emitted with done={}",
                state.emitted, state.done
            )));
        }

        Ok(Self {
            config: state.config,
            total,
            modulus: state.modulus,
            seed: state.seed,
            index: state.index,
            emitted: state.emitted,
            done: state.done,
            naf: state.naf,
        })
    }
}

impl fmt::Display for RandomizedMinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RandomizedMinter=[#{}, {}]",
            self.index,
            self.naf.path().display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::AlphabetKind;
    use crate::checksum;
    use crate::codec::{decode_minter, encode_minter, CodecError};
    use crate::minter::Minter;
    use std::collections::HashSet;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn settings(dir: &tempfile::TempDir) -> LookupSettings {
        LookupSettings::new(dir.path())
    }

    fn is_alphanumeric_body(text: &str) -> bool {
        AlphabetKind::Alphanumeric.contains_all(text)
    }

    #[test]
    fn test_multiplier_and_increment_give_full_period() {
        assert_eq!(INCREMENT % 2, 1);
        assert_eq!(MULTIPLIER % 4, 1);
    }

    #[test]
    fn test_full_cycle_visits_every_index_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = MinterConfig::new("test", AlphabetKind::Numeric, 2).with_checksums(false);
        let mut minter = RandomizedMinter::new(config, &settings(&dir)).unwrap();

        let mut seen = HashSet::new();
        for _ in 0..100 {
            assert!(minter.has_next());
            let noid = minter.next_noid().unwrap();
            assert!(seen.insert(noid), "repeated identifier");
        }

        assert_eq!(seen.len(), 100);
        assert!(!minter.has_next());
        assert_eq!(minter.index(), minter.seed());
        assert!(matches!(minter.next_noid(), Err(NoidError::Exhausted)));
    }

    #[test]
    fn test_full_cycle_for_every_seed_of_a_non_power_of_two_space() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);

        // 25 identifiers under a modulus of 32.
        for seed in 0..25 {
            let config = MinterConfig::new("test", AlphabetKind::Alpha, 1).with_checksums(false);
            let mut minter = RandomizedMinter::with_seed(config, &settings, seed).unwrap();
            let noids = minter.next_batch(1000).unwrap();

            let distinct: HashSet<_> = noids.iter().collect();
            assert_eq!(noids.len(), 25);
            assert_eq!(distinct.len(), 25);
            assert_eq!(minter.emitted(), 25);
        }
    }

    #[test]
    fn test_next_matches_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let config = MinterConfig::new("test", AlphabetKind::Alphanumeric, 3).with_checksums(false);
        let mut minter = RandomizedMinter::new(config, &settings(&dir)).unwrap();

        for _ in 0..10 {
            let noid = minter.next_noid().unwrap();
            assert_eq!(noid.len(), 3);
            assert!(is_alphanumeric_body(&noid), "{noid}");
        }
    }

    #[test]
    fn test_shoulder_and_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let config = MinterConfig::new("test", AlphabetKind::Alphanumeric, 3)
            .with_shoulder(Some("f5".to_string()));
        let mut minter = RandomizedMinter::new(config, &settings(&dir)).unwrap();

        let noids = minter.next_batch(10).unwrap();
        assert_eq!(noids.len(), 10);
        for noid in noids {
            assert!(noid.starts_with("f5"));
            assert_eq!(noid.len(), 6);
            assert!(is_alphanumeric_body(&noid[2..]));
            assert!(checksum::validate(&noid, AlphabetKind::Alphanumeric).unwrap());
        }
    }

    #[test]
    fn test_get_noid() {
        let dir = tempfile::tempdir().unwrap();
        let config = MinterConfig::new("test", AlphabetKind::Alphanumeric, 3).with_checksums(false);
        let mut minter = RandomizedMinter::new(config, &settings(&dir)).unwrap();

        assert_eq!(minter.get_noid(0).unwrap(), "000");
        assert_eq!(minter.get_noid(35).unwrap(), "010");
        assert!(matches!(
            minter.get_noid(35 * 35 * 35),
            Err(NoidError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_lookup_file_is_shared() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir);
        let a = RandomizedMinter::new(
            MinterConfig::new("one", AlphabetKind::Numeric, 2),
            &settings,
        )
        .unwrap();
        let b = RandomizedMinter::new(
            MinterConfig::new("two", AlphabetKind::Numeric, 2).with_checksums(false),
            &settings,
        )
        .unwrap();

        assert_eq!(a.lookup_file().path(), b.lookup_file().path());
        assert_eq!(
            a.lookup_file().path(),
            dir.path().join("NUMERIC-2.naf").as_path()
        );
    }

    #[test]
    fn test_space_too_large() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir).with_max_space(1000);

        let config = MinterConfig::new("test", AlphabetKind::Numeric, 4);
        assert!(matches!(
            RandomizedMinter::new(config, &settings),
            Err(NoidError::SpaceTooLarge { length: 4, max: 1000, .. })
        ));

        let config = MinterConfig::new("test", AlphabetKind::AlphanumericAll, 100);
        assert!(matches!(
            RandomizedMinter::new(config, &settings),
            Err(NoidError::SpaceTooLarge { .. })
        ));
    }

    #[test]
    fn test_display() {
        let dir = tempfile::tempdir().unwrap();
        let config = MinterConfig::new("test", AlphabetKind::Alphanumeric, 2);
        let minter = RandomizedMinter::with_seed(config, &settings(&dir), 7).unwrap();

        assert_eq!(
            minter.to_string(),
            format!(
                "RandomizedMinter=[#7, {}]",
                dir.path().join("ALPHANUMERIC-2.naf").display()
            )
        );
    }

    fn decode_error(minter: RandomizedMinter) -> String {
        let bytes = encode_minter(&Minter::from(minter)).unwrap();
        let err = decode_minter(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
        err.to_string()
    }

    fn numeric_2(dir: &tempfile::TempDir, seed: u64) -> RandomizedMinter {
        let config = MinterConfig::new("test", AlphabetKind::Numeric, 2).with_checksums(false);
        RandomizedMinter::with_seed(config, &settings(dir), seed).unwrap()
    }

    #[test]
    fn test_decode_rejects_cursor_outside_space() {
        let dir = tempfile::tempdir().unwrap();

        let mut minter = numeric_2(&dir, 5);
        minter.seed = 100;
        minter.index = 100;
        assert!(decode_error(minter).contains("cursor 100/100"));

        let mut minter = numeric_2(&dir, 5);
        minter.index = 250;
        assert!(decode_error(minter).contains("cursor 5/250"));
    }

    #[test]
    fn test_decode_rejects_wrong_geometry() {
        let dir = tempfile::tempdir().unwrap();

        let mut minter = numeric_2(&dir, 5);
        minter.total = 1000;
        assert!(decode_error(minter).contains("space of 1000 identifiers"));

        let mut minter = numeric_2(&dir, 5);
        minter.modulus = 100;
        assert!(decode_error(minter).contains("modulus 100"));

        let mut minter = numeric_2(&dir, 5);
        minter.config.length = 3;
        assert!(decode_error(minter).contains("space of 100 identifiers, expected 1000"));
    }

    #[test]
    fn test_decode_rejects_inconsistent_progress() {
        let dir = tempfile::tempdir().unwrap();

        let mut minter = numeric_2(&dir, 5);
        minter.done = true;
        assert!(decode_error(minter).contains("0 of 100 emitted with done=true"));

        let mut minter = numeric_2(&dir, 5);
        minter.next_batch(3).unwrap();
        minter.emitted = 100;
        assert!(decode_error(minter).contains("100 of 100 emitted with done=false"));

        let mut minter = numeric_2(&dir, 5);
        minter.emitted = 4;
        assert!(decode_error(minter).contains("4 of 100 emitted"));
    }

    #[test]
    fn test_decode_accepts_finished_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut minter = numeric_2(&dir, 5);
        assert_eq!(minter.next_batch(100).unwrap().len(), 100);

        let bytes = encode_minter(&Minter::from(minter)).unwrap();
        let mut decoded = decode_minter(&bytes).unwrap();
        assert!(!decoded.has_next());
        assert!(matches!(decoded.next_noid(), Err(NoidError::Exhausted)));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_shoulder_warning_is_logged_once() {
        let dir = tempfile::tempdir().unwrap();
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let config = MinterConfig::new("test", AlphabetKind::Alphanumeric, 2).with_shoulder(Some("b55".to_string()));
        tracing::subscriber::with_default(subscriber, || {
            RandomizedMinter::new(config, &settings(&dir)).unwrap();
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logs.matches("first-digit convention").count(), 1, "{logs}");
    }
}
