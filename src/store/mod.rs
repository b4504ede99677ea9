//! Durable namespace storage.
//!
//! Each allocated namespace is an ordered, existence-only set of identifier
//! strings plus a [`NamespaceRecord`] in a registry. A namespace is created
//! once, in a single atomic step, and never recreated: creating an existing
//! namespace fails with [`AllocationError::NamespaceExists`] and leaves the
//! stored set untouched.
//!
//! Backends:
//! - [`RedbStore`]: on-disk, one redb table per namespace
//! - [`MemoryStore`]: in-process, for tests and dry runs

mod memory;
mod redb;

pub use self::memory::MemoryStore;
pub use self::redb::RedbStore;

use ark_noid::AlphabetKind;
use serde::{Deserialize, Serialize};

use crate::error::{AllocationError, StoreError};

/// Identifiers buffered, sorted and written together during a bulk load.
pub const BULK_CHUNK: usize = 64 * 1024;

/// Registry entry describing how a namespace was minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRecord {
    pub namespace: String,
    pub alphabet: AlphabetKind,
    pub length: usize,
    pub shoulder: Option<String>,
    pub checksums: bool,
    pub randomized: bool,
    /// Set when identifiers are stored in ARK form.
    pub naan: Option<String>,
    /// Number of identifiers stored.
    pub count: u64,
    /// Unix timestamp of the allocation.
    pub created_at: i64,
}

/// Stream of identifiers fed to [`NamespaceStore::create`].
pub type IdStream<'a> = dyn Iterator<Item = Result<String, AllocationError>> + 'a;

/// A durable set of namespaces.
///
/// Mutation happens only through [`create`](NamespaceStore::create), which
/// the allocator worker calls one namespace at a time. The read operations
/// may run concurrently with it.
pub trait NamespaceStore: Send + Sync {
    /// Whether the namespace has been allocated.
    fn exists(&self, namespace: &str) -> Result<bool, StoreError>;

    /// Create the namespace and fill it from `ids`.
    ///
    /// Either every identifier and the registry record become visible, or
    /// nothing does. The first error from `ids` aborts the creation and is
    /// returned. On success returns the record with its final count.
    fn create(
        &self,
        record: NamespaceRecord,
        ids: &mut IdStream<'_>,
    ) -> Result<NamespaceRecord, AllocationError>;

    /// Registry record of an allocated namespace.
    fn record(&self, namespace: &str) -> Result<Option<NamespaceRecord>, StoreError>;

    /// Whether `id` was allocated in `namespace`.
    fn contains(&self, namespace: &str, id: &str) -> Result<bool, StoreError>;

    /// Names of every allocated namespace, in ascending order.
    fn namespaces(&self) -> Result<Vec<String>, StoreError>;

    /// Number of identifiers allocated in `namespace`.
    fn count(&self, namespace: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.record(namespace)?.map(|record| record.count))
    }
}

/// Pull up to [`BULK_CHUNK`] identifiers from `ids` into `chunk`, sorted.
///
/// Returns `false` once the stream is exhausted and nothing was read.
pub(crate) fn next_sorted_chunk(
    ids: &mut IdStream<'_>,
    chunk: &mut Vec<String>,
) -> Result<bool, AllocationError> {
    chunk.clear();
    while chunk.len() < BULK_CHUNK {
        match ids.next() {
            Some(id) => chunk.push(id?),
            None => break,
        }
    }
    chunk.sort_unstable();
    Ok(!chunk.is_empty())
}
