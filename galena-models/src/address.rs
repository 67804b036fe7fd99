// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::ModelsError;
use galena_hash::Hash;
use galena_serialization::{Deserializer, SerializeError, Serializer};
use galena_signature::PublicKey;
use nom::{
    error::{context, ContextError, ParseError},
    IResult,
};
use std::{convert::TryInto, str::FromStr};

/// Size of an account address, in bytes
pub const ADDRESS_SIZE_BYTES: usize = 20;

/// Identifier of an account, derived from the account's public key: the
/// leading bytes of the hash of the key. The string form is lowercase hex,
/// optionally prefixed with `0x` on input.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Address([u8; ADDRESS_SIZE_BYTES]);

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

impl Address {
    /// The all-zero address, used as the synthetic sender of coinbase
    /// transactions.
    pub const ZERO: Address = Address([0u8; ADDRESS_SIZE_BYTES]);

    /// Computes the address associated with the given public key.
    ///
    /// # Example
    /// ```
    /// # use galena_models::Address;
    /// # use galena_signature::KeyPair;
    /// let keypair = KeyPair::generate();
    /// let address = Address::from_public_key(&keypair.get_public_key());
    /// ```
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let digest = Hash::compute_from(&public_key.to_bytes());
        let mut bytes = [0u8; ADDRESS_SIZE_BYTES];
        bytes.copy_from_slice(&digest.to_bytes()[..ADDRESS_SIZE_BYTES]);
        Address(bytes)
    }

    /// Serialize an Address as bytes.
    pub fn to_bytes(&self) -> &[u8; ADDRESS_SIZE_BYTES] {
        &self.0
    }

    /// Convert into bytes.
    pub fn into_bytes(self) -> [u8; ADDRESS_SIZE_BYTES] {
        self.0
    }

    /// Deserialize an Address from bytes.
    pub fn from_bytes(data: &[u8; ADDRESS_SIZE_BYTES]) -> Address {
        Address(*data)
    }

    /// Render the address as a lowercase hex string.
    ///
    /// # Example
    /// ```
    /// # use galena_models::Address;
    /// assert_eq!(Address::ZERO.to_hex(), "0".repeat(40));
    /// ```
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse an address from a hex string, accepting an optional `0x` prefix.
    ///
    /// # Example
    /// ```
    /// # use galena_models::Address;
    /// let address = Address::from_hex(&"0".repeat(40)).unwrap();
    /// assert_eq!(address, Address::ZERO);
    /// let prefixed = Address::from_hex(&format!("0x{}", "0".repeat(40))).unwrap();
    /// assert_eq!(prefixed, Address::ZERO);
    /// ```
    pub fn from_hex(data: &str) -> Result<Address, ModelsError> {
        let stripped = data.strip_prefix("0x").unwrap_or(data);
        let decoded = hex::decode(stripped)
            .map_err(|err| ModelsError::DeserializeError(format!("invalid address hex: {}", err)))?;
        let bytes: [u8; ADDRESS_SIZE_BYTES] = decoded.as_slice().try_into().map_err(|_| {
            ModelsError::DeserializeError(format!(
                "invalid address length: {} bytes",
                decoded.len()
            ))
        })?;
        Ok(Address(bytes))
    }
}

/// Serializer for `Address`
#[derive(Default, Clone)]
pub struct AddressSerializer;

impl AddressSerializer {
    /// Creates a serializer for `Address`
    pub const fn new() -> Self {
        Self
    }
}

impl Serializer<Address> for AddressSerializer {
    fn serialize(&self, value: &Address, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        buffer.extend(value.to_bytes());
        Ok(())
    }
}

/// Deserializer for `Address`
#[derive(Default, Clone)]
pub struct AddressDeserializer;

impl AddressDeserializer {
    /// Creates a deserializer for `Address`
    pub const fn new() -> Self {
        Self
    }
}

impl Deserializer<Address> for AddressDeserializer {
    /// ## Example
    /// ```rust
    /// use galena_models::{Address, AddressDeserializer};
    /// use galena_serialization::{Deserializer, DeserializeError};
    ///
    /// let (rest, deserialized) = AddressDeserializer::new()
    ///     .deserialize::<DeserializeError>(Address::ZERO.to_bytes())
    ///     .unwrap();
    /// assert_eq!(deserialized, Address::ZERO);
    /// assert_eq!(rest.len(), 0);
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Address, E> {
        context("Failed address deserialization", |input: &'a [u8]| {
            if buffer.len() < ADDRESS_SIZE_BYTES {
                return Err(nom::Err::Error(ParseError::from_error_kind(
                    input,
                    nom::error::ErrorKind::LengthValue,
                )));
            }
            Ok((
                &buffer[ADDRESS_SIZE_BYTES..],
                Address::from_bytes(&buffer[..ADDRESS_SIZE_BYTES].try_into().map_err(|_| {
                    nom::Err::Error(ParseError::from_error_kind(
                        input,
                        nom::error::ErrorKind::Fail,
                    ))
                })?),
            ))
        })(buffer)
    }
}

impl ::serde::Serialize for Address {
    /// `::serde::Serialize` trait for Address
    /// if the serializer is human readable,
    /// serialization is done using hex
    /// else, it uses the raw bytes
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self.to_hex())
        } else {
            s.serialize_bytes(&self.0)
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for Address {
    /// `::serde::Deserialize` trait for Address
    /// if the deserializer is human readable,
    /// deserialization is done from a hex string
    /// else, from raw bytes
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        if d.is_human_readable() {
            struct HexVisitor;

            impl<'de> ::serde::de::Visitor<'de> for HexVisitor {
                type Value = Address;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("an ASCII hex string")
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    if let Ok(v_str) = std::str::from_utf8(v) {
                        Address::from_hex(v_str).map_err(E::custom)
                    } else {
                        Err(E::invalid_value(::serde::de::Unexpected::Bytes(v), &self))
                    }
                }

                fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    Address::from_hex(v).map_err(E::custom)
                }
            }
            d.deserialize_str(HexVisitor)
        } else {
            struct BytesVisitor;

            impl<'de> ::serde::de::Visitor<'de> for BytesVisitor {
                type Value = Address;

                fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                    formatter.write_str("a bytestring")
                }

                fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
                where
                    E: ::serde::de::Error,
                {
                    Ok(Address::from_bytes(v.try_into().map_err(E::custom)?))
                }
            }

            d.deserialize_bytes(BytesVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galena_signature::KeyPair;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_public_key_is_key_hash_prefix() {
        let keypair = KeyPair::generate();
        let public_key = keypair.get_public_key();
        let address = Address::from_public_key(&public_key);
        let digest = Hash::compute_from(&public_key.to_bytes());
        assert_eq!(address.to_bytes(), &digest.to_bytes()[..ADDRESS_SIZE_BYTES]);
    }

    #[test]
    #[serial]
    fn test_hex_round_trip() {
        let keypair = KeyPair::generate();
        let address = Address::from_public_key(&keypair.get_public_key());
        let encoded = address.to_hex();
        assert_eq!(encoded.len(), ADDRESS_SIZE_BYTES * 2);
        assert_eq!(Address::from_hex(&encoded).unwrap(), address);
        assert_eq!(Address::from_hex(&format!("0x{}", encoded)).unwrap(), address);
        assert_eq!(Address::from_str(&encoded).unwrap(), address);
    }

    #[test]
    #[serial]
    fn test_hex_rejects_bad_input() {
        assert!(Address::from_hex("zz").is_err());
        assert!(Address::from_hex("abcd").is_err());
    }

    #[test]
    #[serial]
    fn test_serde_json() {
        let keypair = KeyPair::generate();
        let address = Address::from_public_key(&keypair.get_public_key());
        let serialized = serde_json::to_string(&address).unwrap();
        assert_eq!(serialized, format!("\"{}\"", address.to_hex()));
        let deserialized: Address = serde_json::from_str(&serialized).unwrap();
        assert_eq!(address, deserialized);
    }
}
