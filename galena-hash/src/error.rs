// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use thiserror::Error;

/// galena_hash error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum GalenaHashError {
    /// Parsing error: {0}
    ParsingError(String),
}
