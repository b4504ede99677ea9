//! NOID array files.
//!
//! A NAF holds every bare identifier of one `(alphabet, length)` space in
//! ascending order: record `i` is the `length` bytes at offset `i * length`.
//! There is no header, delimiter or padding. The file is shared by every
//! randomized minter over the same space and built at most once.
//!
//! Building maps the file in bounded segments, fills each from a
//! [`SequentialMinter`] and flushes it before mapping the next. The build
//! writes to a `.partial` sibling under an exclusive file lock and renames it
//! into place when complete, so readers never observe a half-built file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Instant;

use memmap2::MmapOptions;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use crate::alphabet::AlphabetKind;
use crate::error::{NoidError, Result};
use crate::minter::SequentialMinter;

/// Environment variable consulted when no directory is configured.
pub const DB_FILES_DIR_ENV: &str = "DB_FILES_DIR";

/// File extension of NOID array files.
pub const NAF_EXTENSION: &str = "naf";

/// Upper bound on the bytes mapped at once while building.
pub const MAX_SEGMENT_BYTES: u64 = 1 << 30;

/// Largest identifier space a randomized minter accepts by default.
pub const DEFAULT_MAX_SPACE: u64 = 1 << 62;

/// Where lookup files live and how large a space may be randomized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSettings {
    /// Directory holding `.naf` files.
    pub dir: PathBuf,
    /// Ceiling on `base^length` for randomized minters.
    pub max_space: u64,
}

impl LookupSettings {
    /// Settings rooted at `dir` with the default ceiling.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_space: DEFAULT_MAX_SPACE,
        }
    }

    /// Resolve the directory from an explicit setting, then
    /// [`DB_FILES_DIR_ENV`], then the system temporary directory.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        Self::new(resolve_files_dir(explicit))
    }

    /// Override the space ceiling. Values above [`DEFAULT_MAX_SPACE`] are clamped.
    pub fn with_max_space(mut self, max_space: u64) -> Self {
        self.max_space = max_space.min(DEFAULT_MAX_SPACE);
        self
    }

    /// Path of the lookup file for `(kind, length)`.
    pub fn path_for(&self, kind: AlphabetKind, length: usize) -> PathBuf {
        self.dir.join(file_name(kind, length))
    }
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self::resolve(None)
    }
}

/// Directory for lookup files: explicit setting, environment, temp dir.
pub fn resolve_files_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    match std::env::var_os(DB_FILES_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::temp_dir(),
    }
}

/// `{KIND}-{length}.naf`
pub fn file_name(kind: AlphabetKind, length: usize) -> String {
    format!("{kind}-{length}.{NAF_EXTENSION}")
}

/// A read handle on a complete lookup file.
///
/// Serializes as its path and geometry only; the OS handle is reopened on
/// the first read after deserialization.
#[derive(Debug, Serialize, Deserialize)]
pub struct LookupFile {
    path: PathBuf,
    length: usize,
    total: u64,
    #[serde(skip)]
    handle: Option<File>,
}

impl LookupFile {
    /// Open the lookup file for `(kind, length)`, building it first if absent.
    pub fn open_or_build(settings: &LookupSettings, kind: AlphabetKind, length: usize) -> Result<Self> {
        let total = kind.count(length)?;
        let path = settings.path_for(kind, length);

        if !path.exists() {
            fs::create_dir_all(&settings.dir).map_err(|e| NoidError::lookup(&settings.dir, e))?;
            build(&path, kind, length, MAX_SEGMENT_BYTES)?;
        }

        let file = Self {
            path,
            length,
            total,
            handle: None,
        };
        file.check_size()?;
        Ok(file)
    }

    /// Path of the file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Bytes per record.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Read the bare identifier at record `index`.
    pub fn read(&mut self, index: u64) -> Result<String> {
        if index >= self.total {
            return Err(NoidError::IndexOutOfRange {
                index,
                total: self.total,
            });
        }

        let offset = index * self.length as u64;
        let mut record = vec![0u8; self.length];
        let handle = open_handle(&mut self.handle, &self.path)?;

        handle
            .seek(SeekFrom::Start(offset))
            .and_then(|_| handle.read_exact(&mut record))
            .map_err(|e| NoidError::lookup(&self.path, e))?;

        String::from_utf8(record).map_err(|_| {
            NoidError::lookup(
                &self.path,
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("record {index} is not ASCII"),
                ),
            )
        })
    }

    /// Fail unless the file holds exactly `total * length` bytes.
    fn check_size(&self) -> Result<()> {
        let expected = self.total * self.length as u64;
        let actual = fs::metadata(&self.path)
            .map_err(|e| NoidError::lookup(&self.path, e))?
            .len();

        if actual != expected {
            return Err(NoidError::lookup(
                &self.path,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("expected {expected} bytes, found {actual}"),
                ),
            ));
        }
        Ok(())
    }
}

fn open_handle<'a>(slot: &'a mut Option<File>, path: &Path) -> Result<&'a mut File> {
    let file = match slot.take() {
        Some(file) => file,
        None => File::open(path).map_err(|e| NoidError::lookup(path, e))?,
    };
    Ok(slot.insert(file))
}

/// Write the lookup file for `(kind, length)` to `path`.
///
/// Records are written in segments of at most `segment_bytes` (rounded down
/// to whole records). Returns immediately if another builder finished the
/// file while this one waited for the lock.
pub(crate) fn build(path: &Path, kind: AlphabetKind, length: usize, segment_bytes: u64) -> Result<()> {
    let total = kind.count(length)?;
    let record = length as u64;
    let total_bytes = total
        .checked_mul(record)
        .ok_or(NoidError::ArithmeticOverflow { kind, length })?;
    let per_segment = (segment_bytes / record).max(1) * record;

    let partial = path.with_extension(format!("{NAF_EXTENSION}.partial"));
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&partial)
        .map_err(|e| NoidError::lookup(&partial, e))?;

    file.lock().map_err(|e| NoidError::lookup(&partial, e))?;

    if path.exists() {
        debug!(path = %path.display(), "Lookup file finished by another builder");
        if let Err(e) = fs::remove_file(&partial) {
            debug!(path = %partial.display(), error = %e, "Could not remove partial lookup file");
        }
        return file.unlock().map_err(|e| NoidError::lookup(&partial, e));
    }

    let span = info_span!("naf_build", kind = %kind, length, total);
    let _guard = span.enter();
    let started = Instant::now();
    info!(path = %path.display(), bytes = total_bytes, "Building lookup file");

    file.set_len(0)
        .and_then(|_| file.set_len(total_bytes))
        .map_err(|e| NoidError::lookup(&partial, e))?;

    let mut minter = SequentialMinter::bare(kind, length)?;
    let mut offset = 0u64;

    while offset < total_bytes {
        let segment_len = per_segment.min(total_bytes - offset);
        debug!(offset, bytes = segment_len, "Mapping lookup file segment");

        // SAFETY: the file is held under an exclusive lock under a private
        // `.partial` name, so no other mapping or writer can observe or
        // resize it while this map is alive.
        #[allow(unsafe_code)]
        let mut map = unsafe {
            MmapOptions::new()
                .offset(offset)
                .len(segment_len as usize)
                .map_mut(&file)
        }
        .map_err(|e| NoidError::lookup(&partial, e))?;

        for slot in map.chunks_exact_mut(length) {
            minter.next_bare_into(slot)?;
        }

        map.flush().map_err(|e| NoidError::lookup(&partial, e))?;
        offset += segment_len;
    }

    file.set_len(offset)
        .and_then(|_| file.sync_all())
        .and_then(|_| fs::rename(&partial, path))
        .map_err(|e| NoidError::lookup(path, e))?;
    file.unlock().map_err(|e| NoidError::lookup(path, e))?;

    info!(
        path = %path.display(),
        count = minter.index(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Lookup file built"
    );
    Ok(())
}
