// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Core data structures of the chain: addresses, amounts, transactions,
//! blocks, and the generic signed envelope carried by all authenticated
//! payloads.

#![warn(missing_docs)]

pub use address::{Address, AddressDeserializer, AddressSerializer, ADDRESS_SIZE_BYTES};
pub use amount::{Amount, AmountDeserializer, AmountSerializer};
pub use block::{
    results_root, transactions_root, Block, BlockDeserializer, BlockHeader,
    BlockHeaderDeserializer, BlockHeaderSerializer, BlockId, BlockSerializer, SignedBlockHeader,
    BLOCK_ID_SIZE_BYTES, MAX_EXTRA_DATA_SIZE,
};
pub use error::ModelsError;
pub use signed::{Id, Signed, SignedContent, SignedDeserializer, SignedSerializer};
pub use transaction::{
    SignedTransaction, Transaction, TransactionDeserializer, TransactionId, TransactionResult,
    TransactionResultDeserializer, TransactionResultSerializer, TransactionSerializer,
    TransactionType, MAX_TRANSACTION_DATA_SIZE,
};

/// addresses derived from public keys
pub mod address;
/// coin amount newtype with checked arithmetic
pub mod amount;
/// blocks, headers and their ids
pub mod block;
/// models error
pub mod error;
/// trait for signed struct
pub mod signed;
/// transactions and execution results
pub mod transaction;
