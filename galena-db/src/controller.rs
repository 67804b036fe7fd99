// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::DbBatch;

/// Independent key namespaces of the backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreName {
    /// chain indices: latest-block pointer, number → id, transaction
    /// locators, per-account transaction history, validator roster,
    /// forged/missed counters
    Index,
    /// block id → full encoded block bytes
    Block,
    /// address → encoded account record
    Account,
    /// delegate registry: records plus enumeration keys
    Delegate,
    /// voter ++ delegate → outstanding vote amount
    Vote,
}

/// Capability trait over a namespaced key-value engine.
///
/// The contract is intentionally small: point reads, point writes, and one
/// atomic multi-namespace batch commit. No delete, no range scan, no
/// long-lived transactions. Multi-key consistency is the caller's job and is
/// achieved by staging every related write into a single [`DbBatch`].
pub trait Database: Send + Sync {
    /// Point read of `key` in `store`
    fn get(&self, store: StoreName, key: &[u8]) -> Option<Vec<u8>>;

    /// Point write of `key` in `store`
    fn put(&self, store: StoreName, key: &[u8], value: Vec<u8>);

    /// Apply every staged write of `batch` atomically: a concurrent reader
    /// observes either none or all of them, and a crash durably keeps either
    /// none or all
    fn write_batch(&self, batch: DbBatch);
}
