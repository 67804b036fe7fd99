// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Generic signed envelope carried by every authenticated payload.
//!
//! A `Signed<T, I>` pairs a content value with the signature of its encoding
//! and the signer's public key. The identity `I` is the hash of the encoded
//! content alone, so it is stable across re-signing and excludes the
//! signature and key. The wire form is `signature ++ public key ++ content
//! bytes`, which lets the content bytes be sliced back out of a stored
//! record without re-encoding.

use std::fmt::Display;

use crate::{Address, ModelsError};
use galena_hash::Hash;
use galena_serialization::{Deserializer, SerializeError, Serializer};
use galena_signature::{
    KeyPair, PublicKey, PublicKeyDeserializer, Signature, SignatureDeserializer,
};
use nom::{
    error::{context, ContextError, ParseError},
    sequence::tuple,
    IResult,
};
use serde::{Deserialize, Serialize};

/// Identifier newtype wrapping the content hash of a signed structure
pub trait Id {
    /// New id from the content hash
    fn new(hash: Hash) -> Self;
    /// Get the underlying hash
    fn get_hash(&self) -> Hash;
}

/// Signed structure `T` where `I` is the associated id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signed<T, I>
where
    T: Display + SignedContent,
    I: Id,
{
    /// content
    pub content: T,
    /// signature of the content hash
    pub signature: Signature,
    /// public key of the content creator
    pub public_key: PublicKey,
    /// id, the hash of the serialized content
    pub id: I,
    #[serde(skip)]
    /// content serialized
    pub serialized_data: Vec<u8>,
}

/// Trait defining a structure that can be signed
pub trait SignedContent
where
    Self: Sized + Display,
{
    /// Creates a signed version of the content: serializes it, hashes the
    /// bytes, signs the hash with `keypair`
    fn new_signed<SC: Serializer<Self>, I: Id>(
        content: Self,
        content_serializer: SC,
        keypair: &KeyPair,
    ) -> Result<Signed<Self, I>, ModelsError> {
        let mut content_serialized = Vec::new();
        content_serializer.serialize(&content, &mut content_serialized)?;
        let hash = Hash::compute_from(&content_serialized);
        Ok(Signed {
            signature: keypair.sign(&hash)?,
            public_key: keypair.get_public_key(),
            content,
            serialized_data: content_serialized,
            id: I::new(hash),
        })
    }

    /// Serialize the signed structure
    fn serialize(
        signature: &Signature,
        public_key: &PublicKey,
        serialized_content: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        buffer.extend(signature.to_bytes());
        buffer.extend(public_key.to_bytes());
        buffer.extend(serialized_content);
        Ok(())
    }

    /// Deserialize the signed structure
    fn deserialize<
        'a,
        E: ParseError<&'a [u8]> + ContextError<&'a [u8]>,
        DC: Deserializer<Self>,
        I: Id,
    >(
        signature_deserializer: &SignatureDeserializer,
        public_key_deserializer: &PublicKeyDeserializer,
        content_deserializer: &DC,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Signed<Self, I>, E> {
        let (serialized_data, (signature, public_key)) = context(
            "Failed signed deserialization",
            tuple((
                context("Failed signature deserialization", |input| {
                    signature_deserializer.deserialize(input)
                }),
                context("Failed public_key deserialization", |input| {
                    public_key_deserializer.deserialize(input)
                }),
            )),
        )(buffer)?;
        let (rest, content) = content_deserializer.deserialize(serialized_data)?;
        // Avoid getting the rest of the data in the serialized data
        let content_serialized = &serialized_data[..serialized_data.len() - rest.len()];
        Ok((
            rest,
            Signed {
                content,
                signature,
                public_key,
                serialized_data: content_serialized.to_vec(),
                id: I::new(Hash::compute_from(content_serialized)),
            },
        ))
    }
}

impl<T, I> Display for Signed<T, I>
where
    T: Display + SignedContent,
    I: Id,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Signature: {}", self.signature)?;
        writeln!(f, "Creator pubkey: {}", self.public_key)?;
        writeln!(f, "Id: {}", self.id.get_hash())?;
        writeln!(f, "{}", self.content)?;
        Ok(())
    }
}

impl<T, I> Signed<T, I>
where
    T: Display + SignedContent,
    I: Id,
{
    /// Address of the signer, derived from the embedded public key
    pub fn creator_address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    /// Checks that the signature matches the embedded public key over the
    /// hash of the serialized content
    pub fn verify_signature(&self) -> Result<(), ModelsError> {
        let hash = Hash::compute_from(&self.serialized_data);
        Ok(self.public_key.verify_signature(&hash, &self.signature)?)
    }
}

// No content serializer needed: the serialized content bytes are kept in the
// envelope from signing time.
/// Serializer for `Signed` structures
#[derive(Default)]
pub struct SignedSerializer;

impl SignedSerializer {
    /// Creates a new `SignedSerializer`
    pub const fn new() -> Self {
        Self
    }
}

impl<T, I> Serializer<Signed<T, I>> for SignedSerializer
where
    T: Display + SignedContent,
    I: Id,
{
    fn serialize(&self, value: &Signed<T, I>, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        T::serialize(
            &value.signature,
            &value.public_key,
            &value.serialized_data,
            buffer,
        )
    }
}

/// Deserializer for `Signed` structures
pub struct SignedDeserializer<T, DT>
where
    T: Display + SignedContent,
    DT: Deserializer<T>,
{
    signature_deserializer: SignatureDeserializer,
    public_key_deserializer: PublicKeyDeserializer,
    content_deserializer: DT,
    marker_t: std::marker::PhantomData<T>,
}

impl<T, DT> SignedDeserializer<T, DT>
where
    T: Display + SignedContent,
    DT: Deserializer<T>,
{
    /// Creates a new `SignedDeserializer` from a deserializer for the content
    pub const fn new(content_deserializer: DT) -> Self {
        Self {
            signature_deserializer: SignatureDeserializer::new(),
            public_key_deserializer: PublicKeyDeserializer::new(),
            content_deserializer,
            marker_t: std::marker::PhantomData,
        }
    }
}

impl<T, I, DT> Deserializer<Signed<T, I>> for SignedDeserializer<T, DT>
where
    T: Display + SignedContent,
    I: Id,
    DT: Deserializer<T>,
{
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Signed<T, I>, E> {
        T::deserialize(
            &self.signature_deserializer,
            &self.public_key_deserializer,
            &self.content_deserializer,
            buffer,
        )
    }
}
