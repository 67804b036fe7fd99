// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::StoreName;
use std::collections::BTreeMap;

/// A staged write set spanning every namespace, applied atomically by
/// [`Database::write_batch`](crate::Database::write_batch).
///
/// Reads through the batch see staged writes, so multi-step update logic can
/// observe its own pending state (a block append reads the transaction count
/// it bumped a few steps earlier). A later `put` for the same key replaces
/// the earlier one.
#[derive(Debug, Clone, Default)]
pub struct DbBatch {
    writes: BTreeMap<(StoreName, Vec<u8>), Vec<u8>>,
}

impl DbBatch {
    /// Creates an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a write of `key` in `store`
    pub fn put(&mut self, store: StoreName, key: &[u8], value: Vec<u8>) {
        self.writes.insert((store, key.to_vec()), value);
    }

    /// Read a staged write back, `None` if `key` was not staged
    pub fn get(&self, store: StoreName, key: &[u8]) -> Option<&[u8]> {
        self.writes
            .get(&(store, key.to_vec()))
            .map(|value| value.as_slice())
    }

    /// Number of staged writes
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// True when no write is staged
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Consume the batch, yielding every staged write
    pub fn into_writes(self) -> impl Iterator<Item = ((StoreName, Vec<u8>), Vec<u8>)> {
        self.writes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_read_through_sees_staged_writes() {
        let mut batch = DbBatch::new();
        assert!(batch.is_empty());
        batch.put(StoreName::Index, b"key", vec![1]);
        assert_eq!(batch.get(StoreName::Index, b"key"), Some(&[1u8][..]));
        // same key in another namespace is independent
        assert_eq!(batch.get(StoreName::Block, b"key"), None);
    }

    #[test]
    #[serial]
    fn test_later_put_replaces_earlier() {
        let mut batch = DbBatch::new();
        batch.put(StoreName::Index, b"key", vec![1]);
        batch.put(StoreName::Index, b"key", vec![2]);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.get(StoreName::Index, b"key"), Some(&[2u8][..]));
    }
}
