//! Redb-backed namespace store.
//!
//! # Schema
//!
//! ```text
//! namespaces:   namespace -> NamespaceRecord (serde_json)
//! ns:{namespace}: identifier -> ()
//! ```
//!
//! A namespace's table and its registry entry are written in one write
//! transaction. Dropping the transaction on any error aborts it, so a failed
//! allocation leaves neither behind.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, TableError};
use tracing::{debug, info};

use super::{next_sorted_chunk, IdStream, NamespaceRecord, NamespaceStore};
use crate::error::{AllocationError, StoreError};

/// Registry of allocated namespaces.
const NAMESPACES: TableDefinition<&str, &[u8]> = TableDefinition::new("namespaces");

/// Prefix of per-namespace identifier tables.
pub const TABLE_PREFIX: &str = "ns:";

fn table_name(namespace: &str) -> String {
    format!("{TABLE_PREFIX}{namespace}")
}

/// Redb-backed namespace persistence.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref())?;
        Self::new(Arc::new(db))
    }

    /// Wrap an existing database, creating the registry table if needed.
    pub fn new(db: Arc<Database>) -> Result<Self, StoreError> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(NAMESPACES)?;
        }
        write_txn.commit()?;

        info!("Namespace store initialized");
        Ok(Self { db })
    }
}

impl NamespaceStore for RedbStore {
    fn exists(&self, namespace: &str) -> Result<bool, StoreError> {
        let read_txn = self.db.begin_read()?;
        let registry = read_txn.open_table(NAMESPACES)?;
        Ok(registry.get(namespace)?.is_some())
    }

    fn create(
        &self,
        mut record: NamespaceRecord,
        ids: &mut IdStream<'_>,
    ) -> Result<NamespaceRecord, AllocationError> {
        let name = table_name(&record.namespace);
        let definition: TableDefinition<&str, ()> = TableDefinition::new(&name);

        let write_txn = self.db.begin_write().map_err(StoreError::from)?;
        {
            let mut registry = write_txn.open_table(NAMESPACES).map_err(StoreError::from)?;
            if registry
                .get(record.namespace.as_str())
                .map_err(StoreError::from)?
                .is_some()
            {
                return Err(AllocationError::NamespaceExists(record.namespace));
            }

            let mut table = write_txn.open_table(definition).map_err(StoreError::from)?;
            let mut chunk = Vec::new();
            let mut count = 0u64;

            while next_sorted_chunk(ids, &mut chunk)? {
                for id in &chunk {
                    if table.insert(id.as_str(), ()).map_err(StoreError::from)?.is_none() {
                        count += 1;
                    }
                }
                debug!(namespace = %record.namespace, count, "Bulk load progress");
            }

            record.count = count;
            let value = serde_json::to_vec(&record)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            registry
                .insert(record.namespace.as_str(), value.as_slice())
                .map_err(StoreError::from)?;
        }
        write_txn.commit().map_err(StoreError::from)?;

        Ok(record)
    }

    fn record(&self, namespace: &str) -> Result<Option<NamespaceRecord>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let registry = read_txn.open_table(NAMESPACES)?;

        match registry.get(namespace)? {
            Some(value) => serde_json::from_slice(value.value())
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    fn contains(&self, namespace: &str, id: &str) -> Result<bool, StoreError> {
        let name = table_name(namespace);
        let definition: TableDefinition<&str, ()> = TableDefinition::new(&name);

        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(definition) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        Ok(table.get(id)?.is_some())
    }

    fn namespaces(&self) -> Result<Vec<String>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let registry = read_txn.open_table(NAMESPACES)?;

        let mut names = Vec::new();
        for item in registry.iter()? {
            let (key, _value) = item?;
            names.push(key.value().to_string());
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{exercise_store, ids, record};

    #[test]
    fn test_redb_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("arkd.redb")).unwrap();
        exercise_store(&store);
    }

    #[test]
    fn test_namespaces_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arkd.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            store
                .create(record("persist"), &mut ids(&["01", "02"]))
                .unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        assert!(store.exists("persist").unwrap());
        assert!(store.contains("persist", "02").unwrap());
        assert_eq!(store.count("persist").unwrap(), Some(2));
    }

    #[test]
    fn test_chunked_load_of_unsorted_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("arkd.redb")).unwrap();

        let total = crate::store::BULK_CHUNK as u64 + 1000;
        let mut reversed = (0..total)
            .rev()
            .map(|n| Ok::<_, AllocationError>(format!("{n:08}")));
        let created = store.create(record("big"), &mut reversed).unwrap();

        assert_eq!(created.count, total);
        assert!(store.contains("big", "00000000").unwrap());
        assert!(store.contains("big", &format!("{:08}", total - 1)).unwrap());
    }
}
