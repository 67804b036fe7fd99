// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::{Database, DbBatch, StoreName};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// In-memory reference engine: every namespace in one map under a single
/// lock, so `write_batch` is trivially atomic with respect to readers.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    entries: RwLock<BTreeMap<(StoreName, Vec<u8>), Vec<u8>>>,
}

impl MemoryDatabase {
    /// Creates an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries across all namespaces
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing has been stored
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Database for MemoryDatabase {
    fn get(&self, store: StoreName, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.read().get(&(store, key.to_vec())).cloned()
    }

    fn put(&self, store: StoreName, key: &[u8], value: Vec<u8>) {
        self.entries.write().insert((store, key.to_vec()), value);
    }

    fn write_batch(&self, batch: DbBatch) {
        let mut entries = self.entries.write();
        for (key, value) in batch.into_writes() {
            entries.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_put_get() {
        let db = MemoryDatabase::new();
        assert!(db.is_empty());
        db.put(StoreName::Block, b"id", vec![42]);
        assert_eq!(db.get(StoreName::Block, b"id"), Some(vec![42]));
        assert_eq!(db.get(StoreName::Index, b"id"), None);
    }

    #[test]
    #[serial]
    fn test_write_batch_applies_every_namespace() {
        let db = MemoryDatabase::new();
        let mut batch = DbBatch::new();
        batch.put(StoreName::Index, b"a", vec![1]);
        batch.put(StoreName::Account, b"b", vec![2]);
        batch.put(StoreName::Vote, b"c", vec![3]);
        db.write_batch(batch);
        assert_eq!(db.len(), 3);
        assert_eq!(db.get(StoreName::Index, b"a"), Some(vec![1]));
        assert_eq!(db.get(StoreName::Account, b"b"), Some(vec![2]));
        assert_eq!(db.get(StoreName::Vote, b"c"), Some(vec![3]));
    }
}
