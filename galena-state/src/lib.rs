// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Account and delegate state of the chain.
//!
//! Both stores follow the same discipline: entries are created with
//! zero-value defaults on first reference, mutated in place through an
//! in-memory dirty overlay, and made durable by `commit`, which stages every
//! entry touched since the last commit into the caller's [`DbBatch`]. The
//! ledger core drives both and commits them inside the same atomic batch as
//! the rest of a block's writes.

#![warn(missing_docs)]

pub use account::{Account, AccountDeserializer, AccountLedger, AccountSerializer, AccountState};
pub use delegate::{
    Delegate, DelegateDeserializer, DelegateRegistry, DelegateSerializer, DelegateState,
    MAX_DELEGATE_NAME_LEN, MIN_DELEGATE_NAME_LEN,
};

mod account;
mod delegate;

/// Expect message for infallible decodes of state entries the node itself
/// wrote. A failure means the backing store is corrupted.
pub(crate) const STATE_CRUD_ERROR: &str = "critical: stored state entry is corrupted";
