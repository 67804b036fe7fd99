// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Ledger core of the node: the [`Blockchain`] orchestrator validates and
//! appends blocks under a single writer lock, executes their transactions
//! against account and delegate state, synthesizes the coinbase credit,
//! maintains every derived index, rotates the validator set on schedule,
//! and commits each append as one atomic batch.

#![warn(missing_docs)]

pub use blockchain::{Blockchain, BlockchainListener};
pub use config::ChainConfig;
pub use error::{ChainError, ValidationError};
pub use genesis::GenesisSpec;
pub use validation::{check_block, check_transaction};

mod blockchain;
mod config;
mod error;
mod execution;
mod genesis;
mod validation;

#[cfg(test)]
mod tests;
