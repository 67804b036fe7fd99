// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! BLAKE3 content hashing: the [`Hash`] newtype with bs58-check string
//! forms and codecs, plus the binary [`merkle_root`] commitment used for
//! block transaction and result roots.

#![warn(missing_docs)]
pub use error::GalenaHashError;
pub use hash::{Hash, HashDeserializer, HashSerializer};
pub use merkle::merkle_root;
pub use settings::HASH_SIZE_BYTES;

mod error;
/// hash newtype and codecs
pub mod hash;
/// binary merkle tree commitment
pub mod merkle;
mod settings;
