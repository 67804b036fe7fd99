// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::address::{Address, AddressDeserializer, AddressSerializer};
use crate::signed::{Id, Signed, SignedContent, SignedDeserializer, SignedSerializer};
use crate::transaction::{
    SignedTransaction, Transaction, TransactionDeserializer, TransactionResult,
    TransactionResultDeserializer, TransactionResultSerializer,
};
use crate::ModelsError;
use galena_hash::{merkle_root, Hash, HashDeserializer, HashSerializer, HASH_SIZE_BYTES};
use galena_serialization::{
    Deserializer, SerializeError, Serializer, U32BEDeserializer, U32BESerializer,
    U64BEDeserializer, U64BESerializer, VecU8Deserializer, VecU8Serializer,
};
use nom::error::context;
use nom::multi::length_count;
use nom::sequence::tuple;
use nom::Parser;
use nom::{
    error::{ContextError, ParseError},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;
use std::ops::Bound::Included;
use std::str::FromStr;

/// Size of a block id, in bytes
pub const BLOCK_ID_SIZE_BYTES: usize = HASH_SIZE_BYTES;

/// Maximum size of a block header's `extra_data` field, in bytes
pub const MAX_EXTRA_DATA_SIZE: u32 = 1_024;

/// Block id: the hash of the serialized block header, excluding signature
/// and public key. This is the block's identity hash.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct BlockId(Hash);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.to_bs58_check())
    }
}

impl std::fmt::Debug for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.to_bs58_check())
    }
}

impl FromStr for BlockId {
    type Err = ModelsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(BlockId(Hash::from_str(s)?))
    }
}

impl Id for BlockId {
    fn new(hash: Hash) -> Self {
        BlockId(hash)
    }

    fn get_hash(&self) -> Hash {
        self.0
    }
}

impl BlockId {
    /// Block id to bytes
    pub fn to_bytes(&self) -> &[u8; BLOCK_ID_SIZE_BYTES] {
        self.0.to_bytes()
    }

    /// Block id into bytes
    pub fn into_bytes(self) -> [u8; BLOCK_ID_SIZE_BYTES] {
        self.0.into_bytes()
    }

    /// Block id from bytes
    pub fn from_bytes(data: &[u8; BLOCK_ID_SIZE_BYTES]) -> BlockId {
        BlockId(Hash::from_bytes(data))
    }

    /// Block id from a `bs58` check string
    pub fn from_bs58_check(data: &str) -> Result<BlockId, ModelsError> {
        Ok(BlockId(
            Hash::from_bs58_check(data).map_err(|_| ModelsError::HashError)?,
        ))
    }
}

/// Block header, immutable once signed. The signature covers every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// position in the chain, strictly `parent.number + 1`
    pub number: u64,
    /// address credited with the block reward
    pub coinbase: Address,
    /// id of the parent block, zero for genesis
    pub prev_hash: Hash,
    /// production time, in milliseconds
    pub timestamp: u64,
    /// merkle commitment over the block's transaction ids
    pub transactions_root: Hash,
    /// merkle commitment over the block's transaction result hashes
    pub results_root: Hash,
    /// commitment to the post-execution state
    pub state_root: Hash,
    /// free-form producer payload
    pub extra_data: Vec<u8>,
}

impl std::fmt::Display for BlockHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Number: {}", self.number)?;
        writeln!(f, "Coinbase: {}", self.coinbase)?;
        writeln!(f, "Prev hash: {}", self.prev_hash)?;
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(f, "Transactions root: {}", self.transactions_root)?;
        writeln!(f, "Results root: {}", self.results_root)?;
        writeln!(f, "State root: {}", self.state_root)?;
        Ok(())
    }
}

/// Signed block header
pub type SignedBlockHeader = Signed<BlockHeader, BlockId>;

impl SignedContent for BlockHeader {}

/// Serializer for `BlockHeader`
pub struct BlockHeaderSerializer {
    u64_serializer: U64BESerializer,
    address_serializer: AddressSerializer,
    hash_serializer: HashSerializer,
    extra_data_serializer: VecU8Serializer,
}

impl BlockHeaderSerializer {
    /// Creates a new `BlockHeaderSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64BESerializer::new(),
            address_serializer: AddressSerializer::new(),
            hash_serializer: HashSerializer::new(),
            extra_data_serializer: VecU8Serializer::new(),
        }
    }
}

impl Default for BlockHeaderSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<BlockHeader> for BlockHeaderSerializer {
    fn serialize(&self, value: &BlockHeader, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u64_serializer.serialize(&value.number, buffer)?;
        self.address_serializer.serialize(&value.coinbase, buffer)?;
        self.hash_serializer.serialize(&value.prev_hash, buffer)?;
        self.u64_serializer.serialize(&value.timestamp, buffer)?;
        self.hash_serializer
            .serialize(&value.transactions_root, buffer)?;
        self.hash_serializer.serialize(&value.results_root, buffer)?;
        self.hash_serializer.serialize(&value.state_root, buffer)?;
        self.extra_data_serializer
            .serialize(&value.extra_data, buffer)?;
        Ok(())
    }
}

/// Deserializer for `BlockHeader`
pub struct BlockHeaderDeserializer {
    u64_deserializer: U64BEDeserializer,
    address_deserializer: AddressDeserializer,
    hash_deserializer: HashDeserializer,
    extra_data_deserializer: VecU8Deserializer,
}

impl BlockHeaderDeserializer {
    /// Creates a new `BlockHeaderDeserializer`
    pub const fn new() -> Self {
        Self {
            u64_deserializer: U64BEDeserializer::new(Included(u64::MIN), Included(u64::MAX)),
            address_deserializer: AddressDeserializer::new(),
            hash_deserializer: HashDeserializer::new(),
            extra_data_deserializer: VecU8Deserializer::new(
                Included(u32::MIN),
                Included(MAX_EXTRA_DATA_SIZE),
            ),
        }
    }
}

impl Default for BlockHeaderDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<BlockHeader> for BlockHeaderDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], BlockHeader, E> {
        context(
            "Failed BlockHeader deserialization",
            tuple((
                context("Failed number deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed coinbase deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed prev_hash deserialization", |input| {
                    self.hash_deserializer.deserialize(input)
                }),
                context("Failed timestamp deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
                context("Failed transactions_root deserialization", |input| {
                    self.hash_deserializer.deserialize(input)
                }),
                context("Failed results_root deserialization", |input| {
                    self.hash_deserializer.deserialize(input)
                }),
                context("Failed state_root deserialization", |input| {
                    self.hash_deserializer.deserialize(input)
                }),
                context("Failed extra_data deserialization", |input| {
                    self.extra_data_deserializer.deserialize(input)
                }),
            )),
        )
        .map(
            |(
                number,
                coinbase,
                prev_hash,
                timestamp,
                transactions_root,
                results_root,
                state_root,
                extra_data,
            )| BlockHeader {
                number,
                coinbase,
                prev_hash,
                timestamp,
                transactions_root,
                results_root,
                state_root,
                extra_data,
            },
        )
        .parse(buffer)
    }
}

/// A block: a signed header plus the ordered transactions it commits to and
/// their positionally aligned execution results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// signed header; its id is the block's identity hash
    pub header: SignedBlockHeader,
    /// ordered transactions
    pub transactions: Vec<SignedTransaction>,
    /// execution results, one per transaction
    pub results: Vec<TransactionResult>,
}

impl Block {
    /// The block's identity hash (the hash of its header)
    pub fn id(&self) -> BlockId {
        self.header.id
    }

    /// The block's chain position
    pub fn number(&self) -> u64 {
        self.header.content.number
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Block id: {}", self.id())?;
        writeln!(f, "{}", self.header.content)?;
        writeln!(f, "Transactions: {}", self.transactions.len())?;
        Ok(())
    }
}

/// Compute the merkle commitment over the ids of an ordered transaction list
pub fn transactions_root(transactions: &[SignedTransaction]) -> Hash {
    let leaves: Vec<Hash> = transactions.iter().map(|tx| tx.id.get_hash()).collect();
    merkle_root(&leaves)
}

/// Compute the merkle commitment over the hashes of an ordered result list
pub fn results_root(results: &[TransactionResult]) -> Result<Hash, ModelsError> {
    let leaves: Vec<Hash> = results
        .iter()
        .map(|res| res.compute_hash())
        .collect::<Result<_, _>>()?;
    Ok(merkle_root(&leaves))
}

/// Serializer for `Block`
pub struct BlockSerializer {
    signed_serializer: SignedSerializer,
    u32_serializer: U32BESerializer,
    result_serializer: TransactionResultSerializer,
}

impl BlockSerializer {
    /// Creates a new `BlockSerializer`
    pub const fn new() -> Self {
        Self {
            signed_serializer: SignedSerializer::new(),
            u32_serializer: U32BESerializer::new(),
            result_serializer: TransactionResultSerializer::new(),
        }
    }

    /// Serialize `value` like [`Serializer::serialize`] while reporting the
    /// byte range `[start, end)` occupied by every signed transaction inside
    /// the encoding, in transaction order. The ranges let a single
    /// transaction be decoded straight out of stored block bytes.
    pub fn serialize_with_ranges(
        &self,
        value: &Block,
        buffer: &mut Vec<u8>,
    ) -> Result<Vec<(u32, u32)>, SerializeError> {
        self.signed_serializer.serialize(&value.header, buffer)?;
        let tx_count: u32 = value.transactions.len().try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many transactions in block: {}", err))
        })?;
        self.u32_serializer.serialize(&tx_count, buffer)?;
        let mut ranges = Vec::with_capacity(value.transactions.len());
        for transaction in &value.transactions {
            let start = buffer.len();
            self.signed_serializer.serialize(transaction, buffer)?;
            let range = (
                start.try_into().map_err(|_| {
                    SerializeError::NumberTooBig("block too large for u32 offsets".to_string())
                })?,
                buffer.len().try_into().map_err(|_| {
                    SerializeError::NumberTooBig("block too large for u32 offsets".to_string())
                })?,
            );
            ranges.push(range);
        }
        let result_count: u32 = value.results.len().try_into().map_err(|err| {
            SerializeError::NumberTooBig(format!("too many results in block: {}", err))
        })?;
        self.u32_serializer.serialize(&result_count, buffer)?;
        for result in &value.results {
            self.result_serializer.serialize(result, buffer)?;
        }
        Ok(ranges)
    }
}

impl Default for BlockSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<Block> for BlockSerializer {
    fn serialize(&self, value: &Block, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.serialize_with_ranges(value, buffer).map(|_| ())
    }
}

/// Deserializer for `Block`
pub struct BlockDeserializer {
    header_deserializer: SignedDeserializer<BlockHeader, BlockHeaderDeserializer>,
    length_deserializer: U32BEDeserializer,
    transaction_deserializer: SignedDeserializer<Transaction, TransactionDeserializer>,
    result_deserializer: TransactionResultDeserializer,
}

impl BlockDeserializer {
    /// Creates a new `BlockDeserializer`, rejecting blocks carrying more
    /// than `max_transactions` transactions or results
    pub const fn new(max_transactions: u32) -> Self {
        Self {
            header_deserializer: SignedDeserializer::new(BlockHeaderDeserializer::new()),
            length_deserializer: U32BEDeserializer::new(Included(0), Included(max_transactions)),
            transaction_deserializer: SignedDeserializer::new(TransactionDeserializer::new()),
            result_deserializer: TransactionResultDeserializer::new(),
        }
    }
}

impl Deserializer<Block> for BlockDeserializer {
    /// ```
    /// use galena_models::{
    ///     transactions_root, results_root, Block, BlockDeserializer, BlockHeader,
    ///     BlockHeaderSerializer, BlockSerializer, Address, SignedContent,
    /// };
    /// use galena_hash::Hash;
    /// use galena_serialization::{Serializer, Deserializer, DeserializeError};
    /// use galena_signature::KeyPair;
    ///
    /// let keypair = KeyPair::generate();
    /// let header = BlockHeader {
    ///     number: 1,
    ///     coinbase: Address::from_public_key(&keypair.get_public_key()),
    ///     prev_hash: Hash::zero(),
    ///     timestamp: 0,
    ///     transactions_root: transactions_root(&[]),
    ///     results_root: results_root(&[]).unwrap(),
    ///     state_root: Hash::zero(),
    ///     extra_data: vec![],
    /// };
    /// let block = Block {
    ///     header: BlockHeader::new_signed(header, BlockHeaderSerializer::new(), &keypair).unwrap(),
    ///     transactions: vec![],
    ///     results: vec![],
    /// };
    /// let mut buffer = Vec::new();
    /// BlockSerializer::new().serialize(&block, &mut buffer).unwrap();
    /// let (rest, decoded) = BlockDeserializer::new(100)
    ///     .deserialize::<DeserializeError>(&buffer)
    ///     .unwrap();
    /// assert!(rest.is_empty());
    /// assert_eq!(decoded.id(), block.id());
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Block, E> {
        context(
            "Failed Block deserialization",
            tuple((
                context("Failed header deserialization", |input| {
                    self.header_deserializer.deserialize(input)
                }),
                length_count(
                    context("Failed transaction count deserialization", |input| {
                        self.length_deserializer.deserialize(input)
                    }),
                    context("Failed transaction deserialization", |input| {
                        self.transaction_deserializer.deserialize(input)
                    }),
                ),
                length_count(
                    context("Failed result count deserialization", |input| {
                        self.length_deserializer.deserialize(input)
                    }),
                    context("Failed result deserialization", |input| {
                        self.result_deserializer.deserialize(input)
                    }),
                ),
            )),
        )
        .map(|(header, transactions, results)| Block {
            header,
            transactions,
            results,
        })
        .parse(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::transaction::{TransactionSerializer, TransactionType};
    use galena_serialization::DeserializeError;
    use galena_signature::KeyPair;
    use serial_test::serial;

    fn signed_transfer(keypair: &KeyPair, nonce: u64) -> SignedTransaction {
        let content = Transaction {
            tx_type: TransactionType::Transfer,
            from: Address::from_public_key(&keypair.get_public_key()),
            to: Address::ZERO,
            value: Amount::from_raw(5),
            fee: Amount::from_raw(1),
            nonce,
            timestamp: 99,
            data: vec![],
        };
        Transaction::new_signed(content, TransactionSerializer::new(), keypair).unwrap()
    }

    fn sample_block(keypair: &KeyPair, transactions: Vec<SignedTransaction>) -> Block {
        let results: Vec<TransactionResult> = transactions
            .iter()
            .map(|_| TransactionResult::success())
            .collect();
        let header = BlockHeader {
            number: 1,
            coinbase: Address::from_public_key(&keypair.get_public_key()),
            prev_hash: Hash::compute_from(b"parent"),
            timestamp: 1000,
            transactions_root: transactions_root(&transactions),
            results_root: results_root(&results).unwrap(),
            state_root: Hash::zero(),
            extra_data: vec![7],
        };
        Block {
            header: BlockHeader::new_signed(header, BlockHeaderSerializer::new(), keypair)
                .unwrap(),
            transactions,
            results,
        }
    }

    #[test]
    #[serial]
    fn test_block_round_trip() {
        let keypair = KeyPair::generate();
        let block = sample_block(
            &keypair,
            vec![signed_transfer(&keypair, 0), signed_transfer(&keypair, 1)],
        );
        let mut buffer = Vec::new();
        BlockSerializer::new().serialize(&block, &mut buffer).unwrap();
        let (rest, decoded) = BlockDeserializer::new(10)
            .deserialize::<DeserializeError>(&buffer)
            .unwrap();
        assert!(rest.is_empty());
        assert_eq!(decoded.id(), block.id());
        assert_eq!(decoded.header.content, block.header.content);
        assert_eq!(decoded.transactions.len(), 2);
        assert_eq!(decoded.results, block.results);
        decoded.header.verify_signature().unwrap();
    }

    #[test]
    #[serial]
    fn test_transaction_ranges_decode_in_place() {
        let keypair = KeyPair::generate();
        let block = sample_block(
            &keypair,
            vec![signed_transfer(&keypair, 0), signed_transfer(&keypair, 1)],
        );
        let mut buffer = Vec::new();
        let ranges = BlockSerializer::new()
            .serialize_with_ranges(&block, &mut buffer)
            .unwrap();
        assert_eq!(ranges.len(), block.transactions.len());
        let deserializer: SignedDeserializer<Transaction, TransactionDeserializer> =
            SignedDeserializer::new(TransactionDeserializer::new());
        for (i, (start, end)) in ranges.iter().enumerate() {
            let slice = &buffer[*start as usize..*end as usize];
            let (rest, decoded): (&[u8], SignedTransaction) = deserializer
                .deserialize::<DeserializeError>(slice)
                .unwrap();
            assert!(rest.is_empty());
            assert_eq!(decoded.id, block.transactions[i].id);
        }
    }

    #[test]
    #[serial]
    fn test_transaction_count_cap() {
        let keypair = KeyPair::generate();
        let block = sample_block(
            &keypair,
            vec![signed_transfer(&keypair, 0), signed_transfer(&keypair, 1)],
        );
        let mut buffer = Vec::new();
        BlockSerializer::new().serialize(&block, &mut buffer).unwrap();
        BlockDeserializer::new(1)
            .deserialize::<DeserializeError>(&buffer)
            .expect_err("block above the transaction cap should be rejected");
    }

    #[test]
    #[serial]
    fn test_roots_are_order_sensitive() {
        let keypair = KeyPair::generate();
        let mut transactions = vec![signed_transfer(&keypair, 0), signed_transfer(&keypair, 1)];
        let root = transactions_root(&transactions);
        transactions.swap(0, 1);
        assert_ne!(transactions_root(&transactions), root);
    }
}
