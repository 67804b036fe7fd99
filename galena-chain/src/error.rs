// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use galena_models::{BlockId, ModelsError, TransactionId};
use galena_serialization::SerializeError;
use thiserror::Error;

/// Structural defect of a block or transaction, detected by the pure
/// validation predicates before any state mutation
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum ValidationError {
    /// transaction {0} carries an invalid signature
    InvalidTransactionSignature(TransactionId),
    /// transaction {0} signer does not match its sender
    SignerSenderMismatch(TransactionId),
    /// transaction {0} value + fee overflows
    ValueFeeOverflow(TransactionId),
    /// coinbase transaction {0} inside a block body
    CoinbaseInBody(TransactionId),
    /// transaction {0} data is {1} bytes, above the cap of {2}
    DataTooLarge(TransactionId, usize, u32),
    /// block {0} header carries an invalid signature
    InvalidHeaderSignature(BlockId),
    /// block {0} header signer does not match its coinbase
    SignerCoinbaseMismatch(BlockId),
    /// block {id} has {transactions} transactions but {results} results
    ResultCountMismatch {
        /// offending block
        id: BlockId,
        /// transaction count
        transactions: usize,
        /// result count
        results: usize,
    },
    /// block {0} carries {1} transactions, above the cap of {2}
    TooManyTransactions(BlockId, usize, u32),
    /// block {0} extra data is {1} bytes, above the cap of {2}
    ExtraDataTooLarge(BlockId, usize, u32),
    /// block {id} stored transactions root does not match the recomputed one
    TransactionsRootMismatch {
        /// offending block
        id: BlockId,
    },
    /// block {id} stored results root does not match the recomputed one
    ResultsRootMismatch {
        /// offending block
        id: BlockId,
    },
    /// block {id} prev hash does not link to the latest block
    PrevHashMismatch {
        /// offending block
        id: BlockId,
    },
    /// models error during validation: {0}
    Models(#[from] ModelsError),
}

/// Ledger core error
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum ChainError {
    /// non-sequential block: expected number {expected}, got {got}
    NonSequentialBlock {
        /// successor number of the latest block
        expected: u64,
        /// number carried by the rejected block
        got: u64,
    },
    /// block number {number} exceeds the mandatory upgrade ceiling {ceiling}, upgrade the node
    UpgradeRequired {
        /// number carried by the rejected block
        number: u64,
        /// configured ceiling
        ceiling: u64,
    },
    /// invalid block: {0}
    InvalidBlock(#[from] ValidationError),
    /// models error: {0}
    Models(#[from] ModelsError),
    /// serialization error: {0}
    Serialize(#[from] SerializeError),
    /// genesis definition error: {0}
    Genesis(String),
    /// backing store corruption: {0}
    StorageCorruption(String),
}
