//! In-memory namespace store.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;

use super::{next_sorted_chunk, IdStream, NamespaceRecord, NamespaceStore};
use crate::error::{AllocationError, StoreError};

/// Namespaces held in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    namespaces: RwLock<BTreeMap<String, (NamespaceRecord, BTreeSet<String>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NamespaceStore for MemoryStore {
    fn exists(&self, namespace: &str) -> Result<bool, StoreError> {
        Ok(self.namespaces.read().contains_key(namespace))
    }

    fn create(
        &self,
        mut record: NamespaceRecord,
        ids: &mut IdStream<'_>,
    ) -> Result<NamespaceRecord, AllocationError> {
        if self.namespaces.read().contains_key(&record.namespace) {
            return Err(AllocationError::NamespaceExists(record.namespace));
        }

        // Drain outside the lock so readers are never blocked by a long mint.
        let mut set = BTreeSet::new();
        let mut chunk = Vec::new();
        while next_sorted_chunk(ids, &mut chunk)? {
            set.extend(chunk.drain(..));
        }
        record.count = set.len() as u64;

        let mut namespaces = self.namespaces.write();
        if namespaces.contains_key(&record.namespace) {
            return Err(AllocationError::NamespaceExists(record.namespace));
        }
        namespaces.insert(record.namespace.clone(), (record.clone(), set));
        Ok(record)
    }

    fn record(&self, namespace: &str) -> Result<Option<NamespaceRecord>, StoreError> {
        Ok(self
            .namespaces
            .read()
            .get(namespace)
            .map(|(record, _)| record.clone()))
    }

    fn contains(&self, namespace: &str, id: &str) -> Result<bool, StoreError> {
        Ok(self
            .namespaces
            .read()
            .get(namespace)
            .is_some_and(|(_, ids)| ids.contains(id)))
    }

    fn namespaces(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.namespaces.read().keys().cloned().collect())
    }
}
