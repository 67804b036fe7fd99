// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Key-value storage boundary of the node.
//!
//! The ledger core consumes storage exclusively through the [`Database`]
//! capability trait: namespaced `get`/`put` plus an atomic multi-namespace
//! [`DbBatch`] commit. Persistent engines plug in behind the trait;
//! [`MemoryDatabase`] is the in-memory reference engine used by tests.

#![warn(missing_docs)]

pub use batch::DbBatch;
pub use controller::{Database, StoreName};
pub use memory::MemoryDatabase;

mod batch;
mod controller;
mod memory;
