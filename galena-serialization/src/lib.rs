// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Serialization of the data structures exchanged and persisted by the node.
//!
//! All integers are encoded as fixed-width big-endian bytes and all variable
//! length payloads carry a `u32` big-endian length prefix, so every record
//! has a stable, position-addressable layout. Deserializers are `nom` parsers
//! over byte slices and report failures through a context-carrying error.

#![warn(missing_docs)]

use displaydoc::Display;
use nom::bytes::complete::take;
use nom::error::{ContextError, ErrorKind, ParseError, VerboseErrorKind};
use nom::multi::length_data;
use nom::{IResult, Parser};
use std::ops::{Bound, RangeBounds};
use thiserror::Error;

/// Serialization error
#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum SerializeError {
    /// Number {0} is too big to be serialized
    NumberTooBig(String),
    /// String {0} is too big to be serialized
    StringTooBig(String),
    /// General error {0}
    GeneralError(String),
}

/// Deserialization error, keeping the trace of contexts crossed by the parser
pub struct DeserializeError<'a> {
    errors: Vec<(&'a [u8], VerboseErrorKind)>,
}

impl<'a> ParseError<&'a [u8]> for DeserializeError<'a> {
    fn from_error_kind(input: &'a [u8], kind: ErrorKind) -> Self {
        Self {
            errors: vec![(input, VerboseErrorKind::Nom(kind))],
        }
    }

    fn append(input: &'a [u8], kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, VerboseErrorKind::Nom(kind)));
        other
    }

    fn from_char(input: &'a [u8], c: char) -> Self {
        Self {
            errors: vec![(input, VerboseErrorKind::Char(c))],
        }
    }
}

impl<'a> ContextError<&'a [u8]> for DeserializeError<'a> {
    fn add_context(input: &'a [u8], ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, VerboseErrorKind::Context(ctx)));
        other
    }
}

impl std::fmt::Display for DeserializeError<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (input, kind) in self.errors.iter().rev() {
            match kind {
                VerboseErrorKind::Context(ctx) => {
                    writeln!(f, "{} / {} bytes unparsed", ctx, input.len())?
                }
                VerboseErrorKind::Nom(e) => {
                    writeln!(f, "{:?} / {} bytes unparsed", e, input.len())?
                }
                VerboseErrorKind::Char(c) => {
                    writeln!(f, "expected '{}' / {} bytes unparsed", c, input.len())?
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for DeserializeError<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

/// Trait for serializing a value of type `T` into a byte buffer
pub trait Serializer<T> {
    /// Serialize `value` by appending its bytes to `buffer`
    fn serialize(&self, value: &T, buffer: &mut Vec<u8>) -> Result<(), SerializeError>;
}

/// Trait for deserializing a value of type `T` from a byte slice
pub trait Deserializer<T> {
    /// Deserialize a `T` from the start of `buffer`, returning the unparsed
    /// rest of the slice alongside the value
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], T, E>;
}

/// Serializer for `u8`
#[derive(Clone, Default)]
pub struct U8Serializer;

impl U8Serializer {
    /// Creates a `U8Serializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<u8> for U8Serializer {
    fn serialize(&self, value: &u8, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.push(*value);
        Ok(())
    }
}

/// Deserializer for `u8`
#[derive(Clone, Default)]
pub struct U8Deserializer;

impl U8Deserializer {
    /// Creates a `U8Deserializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<u8> for U8Deserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], u8, E> {
        let (rest, byte) = take(1usize)(buffer)?;
        Ok((rest, byte[0]))
    }
}

/// Serializer for `u32`, big-endian fixed width
#[derive(Clone, Default)]
pub struct U32BESerializer;

impl U32BESerializer {
    /// Creates a `U32BESerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<u32> for U32BESerializer {
    /// ```
    /// use galena_serialization::{Serializer, U32BESerializer};
    ///
    /// let mut buffer = Vec::new();
    /// U32BESerializer::new().serialize(&7u32, &mut buffer).unwrap();
    /// assert_eq!(buffer, vec![0, 0, 0, 7]);
    /// ```
    fn serialize(&self, value: &u32, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend(value.to_be_bytes());
        Ok(())
    }
}

/// Deserializer for `u32`, big-endian fixed width, bounds-checked
#[derive(Clone)]
pub struct U32BEDeserializer {
    range: (Bound<u32>, Bound<u32>),
}

impl U32BEDeserializer {
    /// Creates a `U32BEDeserializer`, rejecting values outside the given bounds
    pub const fn new(min_value: Bound<u32>, max_value: Bound<u32>) -> Self {
        Self {
            range: (min_value, max_value),
        }
    }
}

impl Deserializer<u32> for U32BEDeserializer {
    /// ```
    /// use galena_serialization::{Deserializer, DeserializeError, U32BEDeserializer};
    /// use std::ops::Bound::Included;
    ///
    /// let deserializer = U32BEDeserializer::new(Included(u32::MIN), Included(u32::MAX));
    /// let (rest, value) = deserializer.deserialize::<DeserializeError>(&[0, 0, 0, 7, 9]).unwrap();
    /// assert_eq!(value, 7);
    /// assert_eq!(rest, &[9]);
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], u32, E> {
        let (rest, bytes) = take(4usize)(buffer)?;
        // Safe because take would fail just above if less than 4
        let value = u32::from_be_bytes(bytes.try_into().unwrap());
        if !self.range.contains(&value) {
            return Err(nom::Err::Error(ParseError::from_error_kind(
                buffer,
                ErrorKind::Verify,
            )));
        }
        Ok((rest, value))
    }
}

/// Serializer for `u64`, big-endian fixed width
#[derive(Clone, Default)]
pub struct U64BESerializer;

impl U64BESerializer {
    /// Creates a `U64BESerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<u64> for U64BESerializer {
    fn serialize(&self, value: &u64, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend(value.to_be_bytes());
        Ok(())
    }
}

/// Deserializer for `u64`, big-endian fixed width, bounds-checked
#[derive(Clone)]
pub struct U64BEDeserializer {
    range: (Bound<u64>, Bound<u64>),
}

impl U64BEDeserializer {
    /// Creates a `U64BEDeserializer`, rejecting values outside the given bounds
    pub const fn new(min_value: Bound<u64>, max_value: Bound<u64>) -> Self {
        Self {
            range: (min_value, max_value),
        }
    }
}

impl Deserializer<u64> for U64BEDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], u64, E> {
        let (rest, bytes) = take(8usize)(buffer)?;
        // Safe because take would fail just above if less than 8
        let value = u64::from_be_bytes(bytes.try_into().unwrap());
        if !self.range.contains(&value) {
            return Err(nom::Err::Error(ParseError::from_error_kind(
                buffer,
                ErrorKind::Verify,
            )));
        }
        Ok((rest, value))
    }
}

/// Basic `Vec<u8>` serializer: `u32` big-endian length prefix then the bytes
pub struct VecU8Serializer {
    len_serializer: U32BESerializer,
}

impl VecU8Serializer {
    /// Creates a new `VecU8Serializer`
    pub const fn new() -> Self {
        Self {
            len_serializer: U32BESerializer::new(),
        }
    }
}

impl Default for VecU8Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<Vec<u8>> for VecU8Serializer {
    /// ```
    /// use galena_serialization::{Serializer, VecU8Serializer};
    ///
    /// let vec = vec![1, 2, 3];
    /// let mut buffer = Vec::new();
    /// VecU8Serializer::new().serialize(&vec, &mut buffer).unwrap();
    /// assert_eq!(buffer, vec![0, 0, 0, 3, 1, 2, 3]);
    /// ```
    fn serialize(&self, value: &Vec<u8>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let len: u32 = value.len().try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many entries data in VecU8: {}", err))
        })?;
        self.len_serializer.serialize(&len, buffer)?;
        buffer.extend(value);
        Ok(())
    }
}

/// Basic `Vec<u8>` deserializer
pub struct VecU8Deserializer {
    len_deserializer: U32BEDeserializer,
}

impl VecU8Deserializer {
    /// Creates a new `VecU8Deserializer`, rejecting lengths outside the bounds
    pub const fn new(min_length: Bound<u32>, max_length: Bound<u32>) -> Self {
        Self {
            len_deserializer: U32BEDeserializer::new(min_length, max_length),
        }
    }
}

impl Deserializer<Vec<u8>> for VecU8Deserializer {
    /// ```
    /// use galena_serialization::{Serializer, Deserializer, DeserializeError};
    /// use galena_serialization::{VecU8Serializer, VecU8Deserializer};
    /// use std::ops::Bound::Included;
    ///
    /// let vec = vec![1, 2, 3];
    /// let mut serialized = Vec::new();
    /// let serializer = VecU8Serializer::new();
    /// let deserializer = VecU8Deserializer::new(Included(u32::MIN), Included(1000000));
    /// serializer.serialize(&vec, &mut serialized).unwrap();
    /// let (rest, vec_deser) = deserializer.deserialize::<DeserializeError>(&serialized).unwrap();
    /// assert!(rest.is_empty());
    /// assert_eq!(vec, vec_deser);
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Vec<u8>, E> {
        nom::error::context("Failed Vec<u8> deserialization", |input| {
            length_data(|input| {
                self.len_deserializer
                    .deserialize(input)
                    .map(|(rest, len)| (rest, len as usize))
            })(input)
        })
        .map(|res: &[u8]| res.to_vec())
        .parse(buffer)
    }
}

/// Serializer for `String`: `u32` big-endian length prefix then UTF-8 bytes
#[derive(Clone)]
pub struct StringSerializer {
    len_serializer: U32BESerializer,
}

impl StringSerializer {
    /// Creates a new `StringSerializer`
    pub const fn new() -> Self {
        Self {
            len_serializer: U32BESerializer::new(),
        }
    }
}

impl Default for StringSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<String> for StringSerializer {
    fn serialize(&self, value: &String, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        let len: u32 = value.len().try_into().map_err(|_| {
            SerializeError::StringTooBig("The string is too big to be serialized".to_string())
        })?;
        self.len_serializer.serialize(&len, buffer)?;
        buffer.extend(value.as_bytes());
        Ok(())
    }
}

/// Deserializer for `String`, validating UTF-8
#[derive(Clone)]
pub struct StringDeserializer {
    len_deserializer: U32BEDeserializer,
}

impl StringDeserializer {
    /// Creates a new `StringDeserializer`, rejecting lengths outside the bounds
    pub const fn new(min_length: Bound<u32>, max_length: Bound<u32>) -> Self {
        Self {
            len_deserializer: U32BEDeserializer::new(min_length, max_length),
        }
    }
}

impl Deserializer<String> for StringDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], String, E> {
        let (rest, res) = length_data(|input| {
            self.len_deserializer
                .deserialize(input)
                .map(|(rest, len)| (rest, len as usize))
        })
        .map(|data: &[u8]| {
            String::from_utf8(data.to_vec()).map_err(|_| {
                nom::Err::Error(ParseError::from_error_kind(data, ErrorKind::Verify))
            })
        })
        .parse(buffer)?;
        Ok((rest, res?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::ops::Bound::{Excluded, Included};

    #[test]
    #[serial]
    fn test_u32_be_round_trip() {
        let mut buffer = Vec::new();
        U32BESerializer::new()
            .serialize(&70_000u32, &mut buffer)
            .unwrap();
        assert_eq!(buffer.len(), 4);
        let (rest, value) = U32BEDeserializer::new(Included(u32::MIN), Included(u32::MAX))
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(value, 70_000);
    }

    #[test]
    #[serial]
    fn test_u64_be_bounds() {
        let mut buffer = Vec::new();
        U64BESerializer::new()
            .serialize(&10_000_000_000u64, &mut buffer)
            .unwrap();
        assert_eq!(buffer.len(), 8);
        let deserializer = U64BEDeserializer::new(Included(0), Excluded(10_000_000_000));
        deserializer
            .deserialize::<DeserializeError>(&buffer)
            .expect_err("value at the excluded bound should be rejected");
        let deserializer = U64BEDeserializer::new(Included(0), Included(10_000_000_000));
        let (_, value) = deserializer
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert_eq!(value, 10_000_000_000);
    }

    #[test]
    #[serial]
    fn test_u64_be_truncated_input() {
        U64BEDeserializer::new(Included(u64::MIN), Included(u64::MAX))
            .deserialize::<DeserializeError>(&[1, 2, 3])
            .expect_err("truncated u64 should fail to parse");
    }

    #[test]
    #[serial]
    fn test_vec_u8() {
        let vec: Vec<u8> = vec![9, 8, 7];
        let vec_u8_serializer = VecU8Serializer::new();
        let vec_u8_deserializer = VecU8Deserializer::new(Included(u32::MIN), Included(u32::MAX));
        let mut serialized = Vec::new();
        vec_u8_serializer.serialize(&vec, &mut serialized).unwrap();
        let (rest, new_vec) = vec_u8_deserializer
            .deserialize::<DeserializeError>(&serialized)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(vec, new_vec);
    }

    #[test]
    #[serial]
    fn test_vec_u8_too_long() {
        let vec: Vec<u8> = vec![9, 8, 7];
        let mut serialized = Vec::new();
        VecU8Serializer::new()
            .serialize(&vec, &mut serialized)
            .unwrap();
        let vec_u8_deserializer = VecU8Deserializer::new(Included(0), Included(2));
        vec_u8_deserializer
            .deserialize::<DeserializeError>(&serialized)
            .expect_err("length above the bound should be rejected");
    }

    #[test]
    #[serial]
    fn test_vec_u8_length_beyond_data() {
        let mut serialized = Vec::new();
        U32BESerializer::new()
            .serialize(&10u32, &mut serialized)
            .unwrap();
        serialized.extend([9, 8, 7]);
        let vec_u8_deserializer = VecU8Deserializer::new(Included(u32::MIN), Included(u32::MAX));
        vec_u8_deserializer
            .deserialize::<DeserializeError>(&serialized)
            .expect_err("length prefix larger than the data should fail");
    }

    #[test]
    #[serial]
    fn test_string_round_trip() {
        let value = "galena".to_string();
        let mut serialized = Vec::new();
        StringSerializer::new()
            .serialize(&value, &mut serialized)
            .unwrap();
        let (rest, out) = StringDeserializer::new(Included(u32::MIN), Included(u32::MAX))
            .deserialize::<DeserializeError>(&serialized)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(out, value);
    }

    #[test]
    #[serial]
    fn test_string_codecs_clone_into_working_copies() {
        let value = "galena".to_string();
        let serializer = StringSerializer::new();
        let deserializer = StringDeserializer::new(Included(u32::MIN), Included(u32::MAX));
        let mut serialized = Vec::new();
        serializer.clone().serialize(&value, &mut serialized).unwrap();
        let (rest, out) = deserializer
            .clone()
            .deserialize::<DeserializeError>(&serialized)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(out, value);
    }

    #[test]
    #[serial]
    fn test_string_invalid_utf8() {
        let mut serialized = Vec::new();
        U32BESerializer::new()
            .serialize(&2u32, &mut serialized)
            .unwrap();
        serialized.extend([0xff, 0xfe]);
        StringDeserializer::new(Included(u32::MIN), Included(u32::MAX))
            .deserialize::<DeserializeError>(&serialized)
            .expect_err("invalid utf-8 should be rejected");
    }

    #[test]
    #[serial]
    fn test_error_rendering_carries_context() {
        let err = VecU8Deserializer::new(Included(u32::MIN), Included(u32::MAX))
            .deserialize::<DeserializeError>(&[0, 0])
            .unwrap_err();
        match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                let rendered = format!("{}", e);
                assert!(rendered.contains("Failed Vec<u8> deserialization"));
            }
            nom::Err::Incomplete(_) => panic!("unexpected incomplete"),
        }
    }
}
