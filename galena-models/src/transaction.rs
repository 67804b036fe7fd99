// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::address::{Address, AddressDeserializer, AddressSerializer};
use crate::amount::{Amount, AmountDeserializer, AmountSerializer};
use crate::signed::{Id, Signed, SignedContent};
use crate::ModelsError;
use galena_hash::{Hash, HASH_SIZE_BYTES};
use galena_serialization::{
    Deserializer, SerializeError, Serializer, U64BEDeserializer, U64BESerializer, U8Deserializer,
    U8Serializer, VecU8Deserializer, VecU8Serializer,
};
use nom::error::context;
use nom::sequence::tuple;
use nom::Parser;
use nom::{
    error::{ContextError, ErrorKind, ParseError},
    IResult,
};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use std::ops::Bound::Included;
use std::str::FromStr;

/// Size of a transaction id, in bytes
pub const TRANSACTION_ID_SIZE_BYTES: usize = HASH_SIZE_BYTES;

/// Maximum size of the free-form `data` field of a transaction, in bytes
pub const MAX_TRANSACTION_DATA_SIZE: u32 = 10_000;

/// Transaction id: the hash of the serialized transaction content, excluding
/// signature and public key
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct TransactionId(Hash);

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.to_bs58_check())
    }
}

impl std::fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.to_bs58_check())
    }
}

impl FromStr for TransactionId {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TransactionId(Hash::from_str(s)?))
    }
}

impl Id for TransactionId {
    fn new(hash: Hash) -> Self {
        TransactionId(hash)
    }

    fn get_hash(&self) -> Hash {
        self.0
    }
}

impl TransactionId {
    /// Transaction id to bytes
    pub fn to_bytes(&self) -> &[u8; TRANSACTION_ID_SIZE_BYTES] {
        self.0.to_bytes()
    }

    /// Transaction id into bytes
    pub fn into_bytes(self) -> [u8; TRANSACTION_ID_SIZE_BYTES] {
        self.0.into_bytes()
    }

    /// Transaction id from bytes
    pub fn from_bytes(data: &[u8; TRANSACTION_ID_SIZE_BYTES]) -> TransactionId {
        TransactionId(Hash::from_bytes(data))
    }

    /// Transaction id from a `bs58` check string
    pub fn from_bs58_check(data: &str) -> Result<TransactionId, ModelsError> {
        Ok(TransactionId(
            Hash::from_bs58_check(data).map_err(|_| ModelsError::HashError)?,
        ))
    }
}

/// The kind of state transition a transaction applies
#[derive(
    IntoPrimitive, TryFromPrimitive, Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum TransactionType {
    /// transfer coins from sender to recipient
    Transfer = 0,
    /// synthetic block-reward transaction, never valid inside a block body
    Coinbase = 1,
    /// register the sender as a delegate; `data` carries the delegate name
    DelegateRegister = 2,
    /// add `value` to the recipient delegate's vote weight
    DelegateVote = 3,
    /// withdraw up to the sender's outstanding vote on the recipient delegate
    DelegateUnvote = 4,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Transfer => write!(f, "Transfer"),
            TransactionType::Coinbase => write!(f, "Coinbase"),
            TransactionType::DelegateRegister => write!(f, "DelegateRegister"),
            TransactionType::DelegateVote => write!(f, "DelegateVote"),
            TransactionType::DelegateUnvote => write!(f, "DelegateUnvote"),
        }
    }
}

/// A state transition request, as carried inside a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// the kind of transition
    pub tx_type: TransactionType,
    /// sender address
    pub from: Address,
    /// recipient address
    pub to: Address,
    /// transferred amount
    pub value: Amount,
    /// fee paid to the block producer
    pub fee: Amount,
    /// sender's per-account replay counter
    pub nonce: u64,
    /// creation time, in milliseconds
    pub timestamp: u64,
    /// free-form payload (delegate name for registrations)
    pub data: Vec<u8>,
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Type: {}", self.tx_type)?;
        writeln!(f, "From: {}", self.from)?;
        writeln!(f, "To: {}", self.to)?;
        writeln!(f, "Value: {}", self.value)?;
        writeln!(f, "Fee: {}", self.fee)?;
        writeln!(f, "Nonce: {}", self.nonce)?;
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(f, "Data: {} bytes", self.data.len())?;
        Ok(())
    }
}

/// Signed transaction
pub type SignedTransaction = Signed<Transaction, TransactionId>;

impl SignedContent for Transaction {}

/// Serializer for `Transaction`
pub struct TransactionSerializer {
    u8_serializer: U8Serializer,
    address_serializer: AddressSerializer,
    amount_serializer: AmountSerializer,
    u64_serializer: U64BESerializer,
    data_serializer: VecU8Serializer,
}

impl TransactionSerializer {
    /// Creates a new `TransactionSerializer`
    pub const fn new() -> Self {
        Self {
            u8_serializer: U8Serializer::new(),
            address_serializer: AddressSerializer::new(),
            amount_serializer: AmountSerializer::new(),
            u64_serializer: U64BESerializer::new(),
            data_serializer: VecU8Serializer::new(),
        }
    }
}

impl Default for TransactionSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<Transaction> for TransactionSerializer {
    fn serialize(&self, value: &Transaction, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u8_serializer
            .serialize(&u8::from(value.tx_type), buffer)?;
        self.address_serializer.serialize(&value.from, buffer)?;
        self.address_serializer.serialize(&value.to, buffer)?;
        self.amount_serializer.serialize(&value.value, buffer)?;
        self.amount_serializer.serialize(&value.fee, buffer)?;
        self.u64_serializer.serialize(&value.nonce, buffer)?;
        self.u64_serializer.serialize(&value.timestamp, buffer)?;
        self.data_serializer.serialize(&value.data, buffer)?;
        Ok(())
    }
}

/// Deserializer for `Transaction`
pub struct TransactionDeserializer {
    u8_deserializer: U8Deserializer,
    address_deserializer: AddressDeserializer,
    amount_deserializer: AmountDeserializer,
    u64_deserializer: U64BEDeserializer,
    data_deserializer: VecU8Deserializer,
}

impl TransactionDeserializer {
    /// Creates a new `TransactionDeserializer`
    pub const fn new() -> Self {
        Self {
            u8_deserializer: U8Deserializer::new(),
            address_deserializer: AddressDeserializer::new(),
            amount_deserializer: AmountDeserializer::new(Included(u64::MIN), Included(u64::MAX)),
            u64_deserializer: U64BEDeserializer::new(Included(u64::MIN), Included(u64::MAX)),
            data_deserializer: VecU8Deserializer::new(
                Included(u32::MIN),
                Included(MAX_TRANSACTION_DATA_SIZE),
            ),
        }
    }
}

impl Default for TransactionDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Transaction> for TransactionDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Transaction, E> {
        context(
            "Failed Transaction deserialization",
            tuple((
                context("Failed tx_type deserialization", |input| {
                    let (rest, type_id) = self.u8_deserializer.deserialize(input)?;
                    let tx_type = TransactionType::try_from(type_id).map_err(|_| {
                        nom::Err::Error(ParseError::from_error_kind(input, ErrorKind::Verify))
                    })?;
                    Ok((rest, tx_type))
                }),
                context("Failed from deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed to deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed value deserialization", |input| {
                    self.amount_deserializer.deserialize(input)
                }),
                context("Failed fee deserialization", |input| {
                    self.amount_deserializer.deserialize(input)
                }),
                context("Failed nonce deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed timestamp deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed data deserialization", |input| {
                    self.data_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(tx_type, from, to, value, fee, nonce, timestamp, data)| Transaction {
                tx_type,
                from,
                to,
                value,
                fee,
                nonce,
                timestamp,
                data,
            },
        )
        .parse(buffer)
    }
}

/// Outcome of executing one transaction against account and delegate state,
/// positionally aligned with the block's transaction list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    /// whether the state transition was applied
    pub success: bool,
    /// free-form execution output
    pub output: Vec<u8>,
}

impl TransactionResult {
    /// Result of a successfully applied transaction, with no output
    pub fn success() -> Self {
        Self {
            success: true,
            output: Vec::new(),
        }
    }

    /// Result of a rejected transaction, with no output
    pub fn failure() -> Self {
        Self {
            success: false,
            output: Vec::new(),
        }
    }

    /// Hash of the serialized result, used as a leaf of the results root
    pub fn compute_hash(&self) -> Result<Hash, ModelsError> {
        let mut buffer = Vec::new();
        TransactionResultSerializer::new().serialize(self, &mut buffer)?;
        Ok(Hash::compute_from(&buffer))
    }
}

impl std::fmt::Display for TransactionResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Success: {}", self.success)?;
        writeln!(f, "Output: {} bytes", self.output.len())?;
        Ok(())
    }
}

/// Serializer for `TransactionResult`
pub struct TransactionResultSerializer {
    u8_serializer: U8Serializer,
    output_serializer: VecU8Serializer,
}

impl TransactionResultSerializer {
    /// Creates a new `TransactionResultSerializer`
    pub const fn new() -> Self {
        Self {
            u8_serializer: U8Serializer::new(),
            output_serializer: VecU8Serializer::new(),
        }
    }
}

impl Default for TransactionResultSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<TransactionResult> for TransactionResultSerializer {
    fn serialize(
        &self,
        value: &TransactionResult,
        buffer: &mut Vec<u8>,
    ) -> Result<(), SerializeError> {
        self.u8_serializer
            .serialize(&(value.success as u8), buffer)?;
        self.output_serializer.serialize(&value.output, buffer)?;
        Ok(())
    }
}

/// Deserializer for `TransactionResult`
pub struct TransactionResultDeserializer {
    u8_deserializer: U8Deserializer,
    output_deserializer: VecU8Deserializer,
}

impl TransactionResultDeserializer {
    /// Creates a new `TransactionResultDeserializer`
    pub const fn new() -> Self {
        Self {
            u8_deserializer: U8Deserializer::new(),
            output_deserializer: VecU8Deserializer::new(
                Included(u32::MIN),
                Included(MAX_TRANSACTION_DATA_SIZE),
            ),
        }
    }
}

impl Default for TransactionResultDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<TransactionResult> for TransactionResultDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], TransactionResult, E> {
        context(
            "Failed TransactionResult deserialization",
            tuple((
                context("Failed success deserialization", |input| {
                    let (rest, flag) = self.u8_deserializer.deserialize(input)?;
                    if flag > 1 {
                        return Err(nom::Err::Error(ParseError::from_error_kind(
                            input,
                            ErrorKind::Verify,
                        )));
                    }
                    Ok((rest, flag == 1))
                }),
                context("Failed output deserialization", |input| {
                    self.output_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(success, output)| TransactionResult { success, output })
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signed::{SignedDeserializer, SignedSerializer};
    use galena_serialization::DeserializeError;
    use galena_signature::KeyPair;
    use serial_test::serial;

    fn sample_transaction(keypair: &KeyPair) -> Transaction {
        Transaction {
            tx_type: TransactionType::Transfer,
            from: Address::from_public_key(&keypair.get_public_key()),
            to: Address::from_public_key(&KeyPair::generate().get_public_key()),
            value: Amount::from_raw(990),
            fee: Amount::from_raw(10),
            nonce: 0,
            timestamp: 1_234_567,
            data: vec![],
        }
    }

    #[test]
    #[serial]
    fn test_transaction_round_trip() {
        let keypair = KeyPair::generate();
        let transaction = sample_transaction(&keypair);
        let mut buffer = Vec::new();
        TransactionSerializer::new()
            .serialize(&transaction, &mut buffer)
            .unwrap();
        let (rest, out) = TransactionDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(out, transaction);
    }

    #[test]
    #[serial]
    fn test_signed_transaction_round_trip_preserves_id() {
        let keypair = KeyPair::generate();
        let signed: SignedTransaction = Transaction::new_signed(
            sample_transaction(&keypair),
            TransactionSerializer::new(),
            &keypair,
        )
        .unwrap();
        signed.verify_signature().unwrap();
        let mut buffer = Vec::new();
        SignedSerializer::new().serialize(&signed, &mut buffer).unwrap();
        let deserializer = SignedDeserializer::new(TransactionDeserializer::new());
        let (rest, out): (&[u8], SignedTransaction) = deserializer
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(out.id, signed.id);
        assert_eq!(out.content, signed.content);
        out.verify_signature().unwrap();
    }

    #[test]
    #[serial]
    fn test_id_excludes_signature() {
        let keypair = KeyPair::generate();
        let content = sample_transaction(&keypair);
        let signed_a: SignedTransaction =
            Transaction::new_signed(content.clone(), TransactionSerializer::new(), &keypair)
                .unwrap();
        // re-sign the same content with a different key: same id
        let other = KeyPair::generate();
        let signed_b: SignedTransaction =
            Transaction::new_signed(content, TransactionSerializer::new(), &other).unwrap();
        assert_eq!(signed_a.id, signed_b.id);
        assert_ne!(
            signed_a.signature.to_bytes(),
            signed_b.signature.to_bytes()
        );
    }

    #[test]
    #[serial]
    fn test_unknown_type_rejected() {
        let keypair = KeyPair::generate();
        let transaction = sample_transaction(&keypair);
        let mut buffer = Vec::new();
        TransactionSerializer::new()
            .serialize(&transaction, &mut buffer)
            .unwrap();
        buffer[0] = 0xee;
        TransactionDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .expect_err("unknown transaction type should be rejected");
    }

    #[test]
    #[serial]
    fn test_result_round_trip() {
        let result = TransactionResult {
            success: true,
            output: vec![1, 2, 3],
        };
        let mut buffer = Vec::new();
        TransactionResultSerializer::new()
            .serialize(&result, &mut buffer)
            .unwrap();
        let (rest, out) = TransactionResultDeserializer::new()
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(out, result);
        assert_ne!(
            result.compute_hash().unwrap(),
            TransactionResult::failure().compute_hash().unwrap()
        );
    }
}
