// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use thiserror::Error;

/// Result alias carrying a `ModelsError`
pub type ModelsResult<T, E = ModelsError> = core::result::Result<T, E>;

/// models error
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum ModelsError {
    /// hashing error
    HashError,
    /// Serialization error: {0}
    SerializeError(String),
    /// Deserialization error: {0}
    DeserializeError(String),
    /// buffer error: {0}
    BufferError(String),
    /// galena_hash error: {0}
    GalenaHashError(#[from] galena_hash::GalenaHashError),
    /// signature error: {0}
    GalenaSignatureError(#[from] galena_signature::GalenaSignatureError),
    /// serializer error: {0}
    SerializerError(#[from] galena_serialization::SerializeError),
    /// amount parse error
    AmountParseError(String),
    /// checked operation error
    CheckedOperationError(String),
    /// Ledger changes, Amount overflow
    AmountOverflowError,
}
