// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::config::ChainConfig;
use crate::error::{ChainError, ValidationError};
use crate::execution::TransactionExecutor;
use crate::genesis::GenesisSpec;
use crate::validation::check_block;
use galena_db::{Database, DbBatch, StoreName};
use galena_models::{
    Address, Amount, Block, BlockDeserializer, BlockId, BlockSerializer, Id, SignedBlockHeader,
    SignedContent, SignedDeserializer, SignedSerializer, SignedTransaction, Transaction,
    TransactionDeserializer, TransactionId, TransactionSerializer, TransactionType,
    BLOCK_ID_SIZE_BYTES,
};
use galena_serialization::{
    DeserializeError, Deserializer, Serializer, StringDeserializer, StringSerializer,
    U32BEDeserializer, U32BESerializer, U64BEDeserializer,
};
use galena_signature::KeyPair;
use galena_state::{Account, AccountState, Delegate, DelegateState};
use parking_lot::RwLock;
use std::ops::Bound::Included;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Index-store key of the latest-block pointer
const LATEST_BLOCK_HASH_KEY: &[u8] = b"latest_block_hash";

/// Index-store key of the active validator set
const VALIDATORS_KEY: &[u8] = b"validators";

/// Index-store key prefix of per-address forged-block counters
const FORGED_KEY_PREFIX: &[u8] = b"forged";

/// Index-store key prefix of per-address missed-block counters
const MISSED_KEY_PREFIX: &[u8] = b"missed";

/// Byte length of a transaction locator record `{number, start, end}`
const LOCATOR_SIZE_BYTES: usize = 16;

/// Expect message for infallible decodes of index entries the node itself
/// wrote. A failure means the backing store is corrupted.
const CHAIN_CRUD_ERROR: &str = "critical: stored chain index is corrupted";

/// Callback handle notified once per successfully appended block,
/// synchronously, in registration order, on the appending thread
pub trait BlockchainListener: Send + Sync {
    /// Invoked after the block's writes are durable and the latest-block
    /// pointer has advanced. A slow listener delays subsequent appends.
    fn on_block_added(&self, block: &Block);
}

/// State guarded by the single writer lock
struct ChainState {
    latest_block: Block,
    accounts: Box<dyn AccountState>,
    delegates: Box<dyn DelegateState>,
    listeners: Vec<Box<dyn BlockchainListener>>,
}

/// The ledger core: validates and appends blocks to the hash-linked chain,
/// maintains every derived index, drives account and delegate state,
/// rotates the validator set, and fans out block-added notifications.
///
/// `add_block` is the sole mutating entry point and is serialized by one
/// writer lock spanning the whole append protocol. Every write of an append
/// is staged into a single [`DbBatch`] and committed by one atomic
/// `write_batch`, so a reader (or a crash) observes the chain either before
/// or after a block, never mid-append.
pub struct Blockchain {
    config: ChainConfig,
    db: Arc<dyn Database>,
    genesis: Block,
    state: RwLock<ChainState>,
    block_serializer: BlockSerializer,
    block_deserializer: BlockDeserializer,
    signed_serializer: SignedSerializer,
    transaction_deserializer: SignedDeserializer<Transaction, TransactionDeserializer>,
}

impl Blockchain {
    /// Open the chain over `db`, bootstrapping from `genesis_spec` on first
    /// run (no persisted latest-block pointer) and resuming from the
    /// pointer otherwise
    pub fn new(
        config: ChainConfig,
        db: Arc<dyn Database>,
        mut accounts: Box<dyn AccountState>,
        mut delegates: Box<dyn DelegateState>,
        genesis_spec: &GenesisSpec,
    ) -> Result<Self, ChainError> {
        let genesis = genesis_spec.build()?;
        let latest_block = match db.get(StoreName::Index, LATEST_BLOCK_HASH_KEY) {
            None => {
                Self::bootstrap(
                    &config,
                    &db,
                    accounts.as_mut(),
                    delegates.as_mut(),
                    genesis_spec,
                    &genesis,
                )?;
                genesis.clone()
            }
            Some(pointer) => {
                let id = BlockId::from_bytes(&pointer.as_slice().try_into().map_err(|_| {
                    ChainError::StorageCorruption(format!(
                        "latest block pointer is {} bytes, expected {}",
                        pointer.len(),
                        BLOCK_ID_SIZE_BYTES
                    ))
                })?);
                if id == genesis.id() {
                    genesis.clone()
                } else {
                    let bytes = db.get(StoreName::Block, id.to_bytes()).ok_or_else(|| {
                        ChainError::StorageCorruption(format!(
                            "latest block {} has no stored bytes",
                            id
                        ))
                    })?;
                    let (_, block) = BlockDeserializer::new(config.max_block_size)
                        .deserialize::<DeserializeError>(&bytes)
                        .map_err(|err| {
                            ChainError::StorageCorruption(format!(
                                "latest block {} does not decode: {}",
                                id, err
                            ))
                        })?;
                    info!(
                        "resuming chain at block {} ({})",
                        block.number(),
                        block.id()
                    );
                    block
                }
            }
        };
        let max_block_size = config.max_block_size;
        Ok(Self {
            config,
            db,
            genesis,
            state: RwLock::new(ChainState {
                latest_block,
                accounts,
                delegates,
                listeners: Vec::new(),
            }),
            block_serializer: BlockSerializer::new(),
            block_deserializer: BlockDeserializer::new(max_block_size),
            signed_serializer: SignedSerializer::new(),
            transaction_deserializer: SignedDeserializer::new(TransactionDeserializer::new()),
        })
    }

    /// First-run bootstrap: apply the premine, register the initial roster,
    /// compute the initial validator set, and point the chain at genesis,
    /// all through one atomic batch
    fn bootstrap(
        config: &ChainConfig,
        db: &Arc<dyn Database>,
        accounts: &mut dyn AccountState,
        delegates: &mut dyn DelegateState,
        genesis_spec: &GenesisSpec,
        genesis: &Block,
    ) -> Result<(), ChainError> {
        for (address, amount) in &genesis_spec.premine {
            accounts.account_mut(address).balance = *amount;
        }
        for (name, address) in &genesis_spec.delegates {
            if !delegates.register(address, name, 0) {
                return Err(ChainError::Genesis(format!(
                    "invalid or duplicate roster entry {} ({})",
                    name, address
                )));
            }
        }
        let mut batch = DbBatch::new();
        let initial = Self::truncated_validator_set(config, 0, delegates.get_delegates());
        batch.put(
            StoreName::Index,
            VALIDATORS_KEY,
            encode_validators(&initial),
        );
        accounts.commit(&mut batch);
        delegates.commit(&mut batch);
        batch.put(
            StoreName::Index,
            LATEST_BLOCK_HASH_KEY,
            genesis.id().to_bytes().to_vec(),
        );
        db.write_batch(batch);
        info!(
            "bootstrapped genesis {} with {} premined accounts and {} delegates",
            genesis.id(),
            genesis_spec.premine.len(),
            genesis_spec.delegates.len()
        );
        Ok(())
    }

    /// The chain configuration this core was constructed with
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// The in-memory genesis block
    pub fn genesis(&self) -> &Block {
        &self.genesis
    }

    /// Register a listener; it will be notified of every subsequent append,
    /// after already-registered listeners
    pub fn register_listener(&self, listener: Box<dyn BlockchainListener>) {
        self.state.write().listeners.push(listener);
    }

    /// The most recently appended block (genesis when the chain is empty)
    pub fn latest_block(&self) -> Block {
        self.state.read().latest_block.clone()
    }

    /// Number of the latest block
    pub fn latest_block_number(&self) -> u64 {
        self.state.read().latest_block.number()
    }

    /// Identity hash of the latest block
    pub fn latest_block_hash(&self) -> BlockId {
        self.state.read().latest_block.id()
    }

    /// Identity hash of the block at `number`, `None` when the chain has no
    /// such block
    pub fn get_block_hash(&self, number: u64) -> Option<BlockId> {
        if number == 0 {
            return Some(self.genesis.id());
        }
        let bytes = self.db.get(StoreName::Index, &number.to_be_bytes())?;
        Some(BlockId::from_bytes(
            &bytes.as_slice().try_into().expect(CHAIN_CRUD_ERROR),
        ))
    }

    /// The block with identity hash `id`, decoded from stored bytes.
    /// Height 0 answers from the in-memory genesis.
    pub fn get_block(&self, id: &BlockId) -> Option<Block> {
        if *id == self.genesis.id() {
            return Some(self.genesis.clone());
        }
        let bytes = self.db.get(StoreName::Block, id.to_bytes())?;
        let (_, block) = self
            .block_deserializer
            .deserialize::<DeserializeError>(&bytes)
            .expect(CHAIN_CRUD_ERROR);
        Some(block)
    }

    /// The block at `number`
    pub fn get_block_by_number(&self, number: u64) -> Option<Block> {
        self.get_block(&self.get_block_hash(number)?)
    }

    /// The signed header of the block with identity hash `id`
    pub fn get_block_header(&self, id: &BlockId) -> Option<SignedBlockHeader> {
        self.get_block(id).map(|block| block.header)
    }

    /// The signed header of the block at `number`
    pub fn get_block_header_by_number(&self, number: u64) -> Option<SignedBlockHeader> {
        self.get_block_by_number(number).map(|block| block.header)
    }

    /// The transaction with id `id`, whether it was carried inside a block
    /// body (decoded straight out of the stored block bytes through its
    /// locator record) or synthesized as a coinbase (stored in full)
    pub fn get_transaction(&self, id: &TransactionId) -> Option<SignedTransaction> {
        let record = self.db.get(StoreName::Index, id.to_bytes())?;
        let bytes = if record.len() == LOCATOR_SIZE_BYTES {
            let (number, start, end) = decode_locator(&record);
            let block_id = self.get_block_hash(number)?;
            let block_bytes = self.db.get(StoreName::Block, block_id.to_bytes())?;
            block_bytes.get(start as usize..end as usize)?.to_vec()
        } else {
            record
        };
        let (_, transaction) = self
            .transaction_deserializer
            .deserialize::<DeserializeError>(&bytes)
            .expect(CHAIN_CRUD_ERROR);
        Some(transaction)
    }

    /// Number of the block that carried transaction `id`. Coinbase
    /// transactions have no position inside a block body and report `None`,
    /// as do unknown ids.
    pub fn get_transaction_block_number(&self, id: &TransactionId) -> Option<u64> {
        let record = self.db.get(StoreName::Index, id.to_bytes())?;
        if record.len() != LOCATOR_SIZE_BYTES {
            return None;
        }
        let (number, _, _) = decode_locator(&record);
        Some(number)
    }

    /// Total number of transactions indexed for `address` (sender,
    /// recipient, and coinbase credits each count once)
    pub fn get_total_transactions(&self, address: &Address) -> u32 {
        match self.db.get(StoreName::Index, address.to_bytes()) {
            Some(bytes) => decode_u32(&bytes),
            None => 0,
        }
    }

    /// Page `[from, to)` of `address`'s transaction history, oldest first
    pub fn get_transactions(
        &self,
        address: &Address,
        from: u32,
        to: u32,
    ) -> Vec<SignedTransaction> {
        let total = self.get_total_transactions(address);
        let mut transactions = Vec::new();
        for sequence in from..to.min(total) {
            let key = account_sequence_key(address, sequence);
            let bytes = self
                .db
                .get(StoreName::Index, &key)
                .expect(CHAIN_CRUD_ERROR);
            let id = TransactionId::from_bytes(
                &bytes.as_slice().try_into().expect(CHAIN_CRUD_ERROR),
            );
            if let Some(transaction) = self.get_transaction(&id) {
                transactions.push(transaction);
            }
        }
        transactions
    }

    /// The active validator set, as hex address strings ordered by
    /// descending vote weight at the last rotation
    pub fn get_validators(&self) -> Vec<String> {
        match self.db.get(StoreName::Index, VALIDATORS_KEY) {
            Some(bytes) => decode_validators(&bytes),
            None => Vec::new(),
        }
    }

    /// Number of blocks `address` produced while being the expected primary
    /// validator
    pub fn get_blocks_forged(&self, address: &Address) -> u64 {
        self.read_counter(FORGED_KEY_PREFIX, address)
    }

    /// Number of blocks `address` produced while another validator was the
    /// expected primary
    pub fn get_blocks_missed(&self, address: &Address) -> u64 {
        self.read_counter(MISSED_KEY_PREFIX, address)
    }

    /// Current account entry of `address`
    pub fn get_account(&self, address: &Address) -> Account {
        self.state.read().accounts.get_account(address)
    }

    /// Registered delegate record of `address`, if any
    pub fn get_delegate(&self, address: &Address) -> Option<Delegate> {
        self.state.read().delegates.get_delegate(address)
    }

    /// Every registered delegate, ranked by descending vote weight
    pub fn get_delegates(&self) -> Vec<Delegate> {
        self.state.read().delegates.get_delegates()
    }

    /// Append `block` to the chain.
    ///
    /// The whole protocol runs under the writer lock: structural checks,
    /// index staging, coinbase synthesis, transaction execution,
    /// forged/missed accounting, conditional validator rotation, state
    /// commit, the atomic batch write, the latest-pointer advance, and the
    /// synchronous listener fan-out. A rejected block leaves no trace, in
    /// the store or in the in-memory state overlays.
    pub fn add_block(&self, block: Block) -> Result<(), ChainError> {
        let mut state = self.state.write();
        let number = block.number();
        if number > self.config.mandatory_upgrade {
            error!(
                "block {} exceeds the mandatory upgrade ceiling {}, refusing to append",
                number, self.config.mandatory_upgrade
            );
            return Err(ChainError::UpgradeRequired {
                number,
                ceiling: self.config.mandatory_upgrade,
            });
        }
        let expected = state.latest_block.number() + 1;
        if number != expected {
            debug!(
                "rejecting out-of-order block {}: expected {}",
                number, expected
            );
            return Err(ChainError::NonSequentialBlock {
                expected,
                got: number,
            });
        }
        if block.header.content.prev_hash != state.latest_block.id().get_hash() {
            return Err(ValidationError::PrevHashMismatch { id: block.id() }.into());
        }
        check_block(&self.config, &block)?;

        let mut batch = DbBatch::new();
        let mut block_bytes = Vec::new();
        let ranges = self
            .block_serializer
            .serialize_with_ranges(&block, &mut block_bytes)?;
        let id = block.id();
        batch.put(StoreName::Block, id.to_bytes(), block_bytes);
        batch.put(
            StoreName::Index,
            &number.to_be_bytes(),
            id.to_bytes().to_vec(),
        );

        let mut fees = Amount::zero();
        for (transaction, (start, end)) in block.transactions.iter().zip(&ranges) {
            batch.put(
                StoreName::Index,
                transaction.id.to_bytes(),
                encode_locator(number, *start, *end),
            );
            self.append_to_account_index(&mut batch, &transaction.content.from, &transaction.id);
            if transaction.content.to != transaction.content.from {
                self.append_to_account_index(&mut batch, &transaction.content.to, &transaction.id);
            }
            fees = fees.saturating_add(transaction.content.fee);
        }

        // the coinbase is synthesized and staged before execution so every
        // fallible step precedes the first overlay mutation: a rejected
        // append never leaves in-memory state ahead of the unwritten batch
        let reward = self.config.block_reward(number).saturating_add(fees);
        let coinbase_address = block.header.content.coinbase;
        let coinbase = self.synthesize_coinbase(&block, reward)?;
        let mut coinbase_bytes = Vec::new();
        self.signed_serializer
            .serialize(&coinbase, &mut coinbase_bytes)?;
        batch.put(StoreName::Index, coinbase.id.to_bytes(), coinbase_bytes);
        self.append_to_account_index(&mut batch, &coinbase_address, &coinbase.id);

        let ChainState {
            accounts,
            delegates,
            ..
        } = &mut *state;
        let mut executor =
            TransactionExecutor::new(&self.config, accounts.as_mut(), delegates.as_mut());
        for (i, transaction) in block.transactions.iter().enumerate() {
            let result = executor.execute(transaction, number);
            if result.success != block.results[i].success {
                warn!(
                    "transaction {} in block {} re-executed with success={}, block claims {}",
                    transaction.id, id, result.success, block.results[i].success
                );
            }
        }
        {
            let producer = state.accounts.account_mut(&coinbase_address);
            producer.balance = producer.balance.saturating_add(reward);
        }

        self.record_production(&mut batch, number, &coinbase_address);

        if number % self.config.validator_term == 0 {
            let ranked = state.delegates.get_delegates();
            let validators = Self::truncated_validator_set(&self.config, number, ranked);
            info!(
                "rotating validator set at block {}: {} validators",
                number,
                validators.len()
            );
            batch.put(StoreName::Index, VALIDATORS_KEY, encode_validators(&validators));
        }

        state.accounts.commit(&mut batch);
        state.delegates.commit(&mut batch);
        batch.put(
            StoreName::Index,
            LATEST_BLOCK_HASH_KEY,
            id.to_bytes().to_vec(),
        );
        self.db.write_batch(batch);
        state.latest_block = block.clone();
        info!(
            "appended block {} ({}) with {} transactions, reward {}",
            number,
            id,
            block.transactions.len(),
            reward
        );

        for listener in &state.listeners {
            listener.on_block_added(&block);
        }
        Ok(())
    }

    /// Build and sign the synthetic coinbase transaction crediting `reward`
    /// to the block's producer. The signing key is ephemeral: the signature
    /// carries no authorization, the transaction exists so the credit shows
    /// up in the producer's history.
    fn synthesize_coinbase(
        &self,
        block: &Block,
        reward: Amount,
    ) -> Result<SignedTransaction, ChainError> {
        let content = Transaction {
            tx_type: TransactionType::Coinbase,
            from: Address::ZERO,
            to: block.header.content.coinbase,
            value: reward,
            fee: Amount::zero(),
            nonce: 0,
            timestamp: block.header.content.timestamp,
            data: Vec::new(),
        };
        Ok(Transaction::new_signed(
            content,
            TransactionSerializer::new(),
            &KeyPair::generate(),
        )?)
    }

    /// Stage an append of `id` to `address`'s transaction history, reading
    /// the running count through the batch so several appends to the same
    /// address inside one block chain correctly
    fn append_to_account_index(
        &self,
        batch: &mut DbBatch,
        address: &Address,
        id: &TransactionId,
    ) {
        let count = match batch.get(StoreName::Index, address.to_bytes()) {
            Some(bytes) => decode_u32(bytes),
            None => self.get_total_transactions(address),
        };
        batch.put(
            StoreName::Index,
            &account_sequence_key(address, count),
            id.to_bytes().to_vec(),
        );
        batch.put(
            StoreName::Index,
            address.to_bytes(),
            (count + 1).to_be_bytes().to_vec(),
        );
    }

    /// Compare the producer with the expected primary validator for this
    /// height and stage the corresponding counter increment
    fn record_production(&self, batch: &mut DbBatch, number: u64, coinbase: &Address) {
        let validators = self.get_validators();
        if validators.is_empty() {
            return;
        }
        let primary = &validators[((number - 1) % validators.len() as u64) as usize];
        let prefix = if *primary == coinbase.to_hex() {
            FORGED_KEY_PREFIX
        } else {
            MISSED_KEY_PREFIX
        };
        let key = counter_key(prefix, coinbase);
        let current = match self.db.get(StoreName::Index, &key) {
            Some(bytes) => decode_u64(&bytes),
            None => 0,
        };
        batch.put(StoreName::Index, &key, (current + 1).to_be_bytes().to_vec());
    }

    fn read_counter(&self, prefix: &[u8], address: &Address) -> u64 {
        match self.db.get(StoreName::Index, &counter_key(prefix, address)) {
            Some(bytes) => decode_u64(&bytes),
            None => 0,
        }
    }

    /// Rank-truncate `delegates` into the validator set for height `number`
    fn truncated_validator_set(
        config: &ChainConfig,
        number: u64,
        delegates: Vec<Delegate>,
    ) -> Vec<String> {
        let cap = config.number_of_validators(number);
        delegates
            .into_iter()
            .take(cap)
            .map(|delegate| delegate.address.to_hex())
            .collect()
    }
}

fn counter_key(prefix: &[u8], address: &Address) -> Vec<u8> {
    let mut key = prefix.to_vec();
    key.extend(address.to_bytes());
    key
}

fn account_sequence_key(address: &Address, sequence: u32) -> Vec<u8> {
    let mut key = address.to_bytes().to_vec();
    key.extend(sequence.to_be_bytes());
    key
}

fn encode_locator(number: u64, start: u32, end: u32) -> Vec<u8> {
    let mut record = Vec::with_capacity(LOCATOR_SIZE_BYTES);
    record.extend(number.to_be_bytes());
    record.extend(start.to_be_bytes());
    record.extend(end.to_be_bytes());
    record
}

fn decode_locator(record: &[u8]) -> (u64, u32, u32) {
    let number = u64::from_be_bytes(record[..8].try_into().expect(CHAIN_CRUD_ERROR));
    let start = u32::from_be_bytes(record[8..12].try_into().expect(CHAIN_CRUD_ERROR));
    let end = u32::from_be_bytes(record[12..16].try_into().expect(CHAIN_CRUD_ERROR));
    (number, start, end)
}

fn decode_u32(bytes: &[u8]) -> u32 {
    let (_, value) = U32BEDeserializer::new(Included(u32::MIN), Included(u32::MAX))
        .deserialize::<DeserializeError>(bytes)
        .expect(CHAIN_CRUD_ERROR);
    value
}

fn decode_u64(bytes: &[u8]) -> u64 {
    let (_, value) = U64BEDeserializer::new(Included(u64::MIN), Included(u64::MAX))
        .deserialize::<DeserializeError>(bytes)
        .expect(CHAIN_CRUD_ERROR);
    value
}

/// Expect message for validator-set encoding; the set is rank-truncated to
/// `max_validators` entries of fixed-width hex, so encoding cannot fail
const VALIDATOR_SET_ERROR: &str = "critical: validator set cannot be encoded";

fn encode_validators(validators: &[String]) -> Vec<u8> {
    let u32_serializer = U32BESerializer::new();
    let string_serializer = StringSerializer::new();
    let mut buffer = Vec::new();
    let count: u32 = validators.len().try_into().expect(VALIDATOR_SET_ERROR);
    u32_serializer
        .serialize(&count, &mut buffer)
        .expect(VALIDATOR_SET_ERROR);
    for validator in validators {
        string_serializer
            .serialize(validator, &mut buffer)
            .expect(VALIDATOR_SET_ERROR);
    }
    buffer
}

fn decode_validators(bytes: &[u8]) -> Vec<String> {
    let u32_deserializer = U32BEDeserializer::new(Included(u32::MIN), Included(u32::MAX));
    let string_deserializer = StringDeserializer::new(Included(0), Included(64));
    let (mut rest, count) = u32_deserializer
        .deserialize::<DeserializeError>(bytes)
        .expect(CHAIN_CRUD_ERROR);
    let mut validators = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (next, validator) = string_deserializer
            .deserialize::<DeserializeError>(rest)
            .expect(CHAIN_CRUD_ERROR);
        validators.push(validator);
        rest = next;
    }
    validators
}
