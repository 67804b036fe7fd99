// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::ModelsError;
use galena_serialization::{
    Deserializer, SerializeError, Serializer, U64BEDeserializer, U64BESerializer,
};
use nom::error::{context, ContextError, ParseError};
use nom::{IResult, Parser};
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;

/// An amount of coins carried by transactions, fees, balances and vote
/// weights. The underlying representation is a raw `u64` number of base
/// units; all arithmetic is checked or saturating so an uncontrolled
/// overflow can never corrupt a balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Ord, PartialOrd, Default, Hash)]
pub struct Amount(u64);

impl Amount {
    /// Create a zero `Amount`
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Obtains the underlying raw `u64` representation
    pub const fn to_raw(&self) -> u64 {
        self.0
    }

    /// Constructs an `Amount` from the underlying raw `u64` representation
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Safely add self to another amount, saturating the result on overflow
    #[must_use]
    pub fn saturating_add(self, amount: Amount) -> Self {
        Amount(self.0.saturating_add(amount.0))
    }

    /// Safely subtract another amount from self, saturating on underflow
    #[must_use]
    pub fn saturating_sub(self, amount: Amount) -> Self {
        Amount(self.0.saturating_sub(amount.0))
    }

    /// Safely add self to another amount, returning `None` on overflow
    /// ```
    /// # use galena_models::Amount;
    /// let a = Amount::from_raw(42);
    /// let b = Amount::from_raw(7);
    /// assert_eq!(a.checked_add(b), Some(Amount::from_raw(49)));
    /// assert_eq!(Amount::from_raw(u64::MAX).checked_add(b), None);
    /// ```
    pub fn checked_add(self, amount: Amount) -> Option<Self> {
        self.0.checked_add(amount.0).map(Amount)
    }

    /// Safely subtract another amount from self, returning `None` on underflow
    /// ```
    /// # use galena_models::Amount;
    /// let a = Amount::from_raw(42);
    /// let b = Amount::from_raw(7);
    /// assert_eq!(a.checked_sub(b), Some(Amount::from_raw(35)));
    /// assert_eq!(b.checked_sub(a), None);
    /// ```
    pub fn checked_sub(self, amount: Amount) -> Option<Self> {
        self.0.checked_sub(amount.0).map(Amount)
    }

    /// Safely multiply self with a `u64`, returning `None` on overflow
    pub fn checked_mul_u64(self, factor: u64) -> Option<Self> {
        self.0.checked_mul(factor).map(Amount)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = ModelsError;

    fn from_str(str_amount: &str) -> Result<Self, Self::Err> {
        let raw: u64 = str_amount
            .parse()
            .map_err(|_| ModelsError::AmountParseError(str_amount.to_string()))?;
        Ok(Amount(raw))
    }
}

impl ::serde::Serialize for Amount {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(self.0)
    }
}

impl<'de> ::serde::Deserialize<'de> for Amount {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Amount, D::Error> {
        u64::deserialize(d).map(Amount)
    }
}

/// Serializer for `Amount`
#[derive(Clone, Default)]
pub struct AmountSerializer {
    u64_serializer: U64BESerializer,
}

impl AmountSerializer {
    /// Creates a serializer for `Amount`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64BESerializer::new(),
        }
    }
}

impl Serializer<Amount> for AmountSerializer {
    fn serialize(&self, value: &Amount, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u64_serializer.serialize(&value.0, buffer)
    }
}

/// Deserializer for `Amount`
#[derive(Clone)]
pub struct AmountDeserializer {
    u64_deserializer: U64BEDeserializer,
}

impl AmountDeserializer {
    /// Creates a deserializer for `Amount`, rejecting raw values outside the
    /// given bounds
    pub const fn new(min_amount: Bound<u64>, max_amount: Bound<u64>) -> Self {
        Self {
            u64_deserializer: U64BEDeserializer::new(min_amount, max_amount),
        }
    }
}

impl Deserializer<Amount> for AmountDeserializer {
    /// ```
    /// use galena_models::{Amount, AmountDeserializer};
    /// use galena_serialization::{Deserializer, DeserializeError};
    /// use std::ops::Bound::Included;
    ///
    /// let deserializer = AmountDeserializer::new(Included(u64::MIN), Included(u64::MAX));
    /// let (rest, amount) = deserializer
    ///     .deserialize::<DeserializeError>(&[0, 0, 0, 0, 0, 0, 0, 9])
    ///     .unwrap();
    /// assert!(rest.is_empty());
    /// assert_eq!(amount, Amount::from_raw(9));
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Amount, E> {
        context("Failed amount deserialization", |input| {
            self.u64_deserializer.deserialize(input)
        })
        .map(Amount::from_raw)
        .parse(buffer)
    }
}
