// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use thiserror::Error;

/// Errors of the signature crate
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum GalenaSignatureError {
    /// parsing error : {0}
    ParsingError(String),

    /// ed25519 engine error: {0}
    EngineError(#[from] ed25519_dalek::SignatureError),

    /// invalid signature: {0}
    InvalidSignature(String),
}
