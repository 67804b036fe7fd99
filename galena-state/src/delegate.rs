// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::STATE_CRUD_ERROR;
use galena_db::{Database, DbBatch, StoreName};
use galena_models::{
    Address, AddressDeserializer, AddressSerializer, Amount, AmountDeserializer, AmountSerializer,
};
use galena_serialization::{
    DeserializeError, Deserializer, SerializeError, Serializer, StringDeserializer,
    StringSerializer, U32BEDeserializer, U32BESerializer, U64BEDeserializer, U64BESerializer,
};
use nom::error::context;
use nom::sequence::tuple;
use nom::Parser;
use nom::{
    error::{ContextError, ParseError},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound::Included;
use std::sync::Arc;
use tracing::debug;

/// Minimum length of a delegate name, in bytes
pub const MIN_DELEGATE_NAME_LEN: u32 = 3;

/// Maximum length of a delegate name, in bytes
pub const MAX_DELEGATE_NAME_LEN: u32 = 16;

/// Key of the registry size counter in the Delegate namespace
const COUNT_KEY: &[u8] = b"count";

/// Key prefix of the ordinal → address enumeration entries
const ORDINAL_KEY_PREFIX: &[u8] = b"addr";

/// A registered block-production candidate, ranked by accumulated votes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegate {
    /// the delegate's account address
    pub address: Address,
    /// unique registered name
    pub name: String,
    /// accumulated vote weight
    pub votes: Amount,
    /// height of the block that carried the registration
    pub registered_at: u64,
}

impl Delegate {
    /// Checks the delegate-name rule: 3 to 16 bytes of `[a-z0-9_]`
    ///
    /// # Example
    /// ```
    /// # use galena_state::Delegate;
    /// assert!(Delegate::is_valid_name("forger_01"));
    /// assert!(!Delegate::is_valid_name("ab"));
    /// assert!(!Delegate::is_valid_name("Forger"));
    /// ```
    pub fn is_valid_name(name: &str) -> bool {
        let len = name.len() as u32;
        (MIN_DELEGATE_NAME_LEN..=MAX_DELEGATE_NAME_LEN).contains(&len)
            && name
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
    }
}

/// Serializer for `Delegate`
#[derive(Clone, Default)]
pub struct DelegateSerializer {
    address_serializer: AddressSerializer,
    name_serializer: StringSerializer,
    amount_serializer: AmountSerializer,
    u64_serializer: U64BESerializer,
}

impl DelegateSerializer {
    /// Creates a new `DelegateSerializer`
    pub const fn new() -> Self {
        Self {
            address_serializer: AddressSerializer::new(),
            name_serializer: StringSerializer::new(),
            amount_serializer: AmountSerializer::new(),
            u64_serializer: U64BESerializer::new(),
        }
    }
}

impl Serializer<Delegate> for DelegateSerializer {
    fn serialize(&self, value: &Delegate, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.address_serializer.serialize(&value.address, buffer)?;
        self.name_serializer.serialize(&value.name, buffer)?;
        self.amount_serializer.serialize(&value.votes, buffer)?;
        self.u64_serializer
            .serialize(&value.registered_at, buffer)?;
        Ok(())
    }
}

/// Deserializer for `Delegate`
#[derive(Clone)]
pub struct DelegateDeserializer {
    address_deserializer: AddressDeserializer,
    name_deserializer: StringDeserializer,
    amount_deserializer: AmountDeserializer,
    u64_deserializer: U64BEDeserializer,
}

impl DelegateDeserializer {
    /// Creates a new `DelegateDeserializer`
    pub const fn new() -> Self {
        Self {
            address_deserializer: AddressDeserializer::new(),
            name_deserializer: StringDeserializer::new(
                Included(MIN_DELEGATE_NAME_LEN),
                Included(MAX_DELEGATE_NAME_LEN),
            ),
            amount_deserializer: AmountDeserializer::new(Included(u64::MIN), Included(u64::MAX)),
            u64_deserializer: U64BEDeserializer::new(Included(u64::MIN), Included(u64::MAX)),
        }
    }
}

impl Default for DelegateDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Delegate> for DelegateDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Delegate, E> {
        context(
            "Failed Delegate deserialization",
            tuple((
                context("Failed address deserialization", |input| {
                    self.address_deserializer.deserialize(input)
                }),
                context("Failed name deserialization", |input| {
                    self.name_deserializer.deserialize(input)
                }),
                context("Failed votes deserialization", |input| {
                    self.amount_deserializer.deserialize(input)
                }),
                context("Failed registered_at deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(address, name, votes, registered_at)| Delegate {
            address,
            name,
            votes,
            registered_at,
        })
        .parse(buffer)
    }
}

/// Capability trait over delegate state: registration, weighted votes with
/// per-voter outstanding records, ranked retrieval, batch-staged commit
pub trait DelegateState: Send + Sync {
    /// The registered record of `address`, `None` when not registered
    fn get_delegate(&self, address: &Address) -> Option<Delegate>;

    /// True when `address` carries a registration
    fn is_registered(&self, address: &Address) -> bool {
        self.get_delegate(address).is_some()
    }

    /// Register `address` under `name`. Returns false when the address is
    /// already registered, the name is already taken, or the name breaks the
    /// delegate-name rule; the registry is unchanged in that case.
    fn register(&mut self, address: &Address, name: &str, at_block: u64) -> bool;

    /// Add `amount` to `delegate`'s vote weight on behalf of `voter`,
    /// recording it against the voter's outstanding total. Returns false
    /// when the delegate is not registered or a weight would overflow.
    fn add_vote(&mut self, voter: &Address, delegate: &Address, amount: Amount) -> bool;

    /// Withdraw `amount` of `voter`'s outstanding vote on `delegate`.
    /// Returns false when the delegate is not registered or the withdrawal
    /// exceeds the voter's outstanding vote.
    fn remove_vote(&mut self, voter: &Address, delegate: &Address, amount: Amount) -> bool;

    /// `voter`'s outstanding vote on `delegate`, zero when none
    fn vote_of(&self, voter: &Address, delegate: &Address) -> Amount;

    /// Every registered delegate, ordered by descending vote weight; equal
    /// weights are ordered by ascending address bytes so the ranking is
    /// identical across nodes
    fn get_delegates(&self) -> Vec<Delegate>;

    /// Stage every record touched since the last commit into `batch`.
    /// Assumes previously committed batches have been applied to the store.
    fn commit(&mut self, batch: &mut DbBatch);
}

/// KV-backed delegate registry.
///
/// Because the storage contract has no range scan, the registry maintains
/// its own enumeration keys in the Delegate namespace: a `count` entry plus
/// one `addr ++ ordinal` entry per registration. Per-voter outstanding vote
/// amounts live in the Vote namespace keyed by `voter ++ delegate`.
pub struct DelegateRegistry {
    db: Arc<dyn Database>,
    delegate_serializer: DelegateSerializer,
    delegate_deserializer: DelegateDeserializer,
    dirty: BTreeMap<Address, Delegate>,
    /// registrations since the last commit, in order, needing new ordinals
    added: Vec<Address>,
    dirty_votes: BTreeMap<(Address, Address), Amount>,
}

impl DelegateRegistry {
    /// Creates a delegate registry over `db`
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            delegate_serializer: DelegateSerializer::new(),
            delegate_deserializer: DelegateDeserializer::new(),
            dirty: BTreeMap::new(),
            added: Vec::new(),
            dirty_votes: BTreeMap::new(),
        }
    }

    fn ordinal_key(ordinal: u32) -> Vec<u8> {
        let mut key = ORDINAL_KEY_PREFIX.to_vec();
        key.extend(ordinal.to_be_bytes());
        key
    }

    fn vote_key(voter: &Address, delegate: &Address) -> Vec<u8> {
        let mut key = voter.to_bytes().to_vec();
        key.extend(delegate.to_bytes());
        key
    }

    fn stored_count(&self) -> u32 {
        match self.db.get(StoreName::Delegate, COUNT_KEY) {
            Some(bytes) => {
                let (_, count) = U32BEDeserializer::new(Included(u32::MIN), Included(u32::MAX))
                    .deserialize::<DeserializeError>(&bytes)
                    .expect(STATE_CRUD_ERROR);
                count
            }
            None => 0,
        }
    }

    fn load(&self, address: &Address) -> Option<Delegate> {
        self.db
            .get(StoreName::Delegate, address.to_bytes())
            .map(|bytes| {
                let (_, delegate) = self
                    .delegate_deserializer
                    .deserialize::<DeserializeError>(&bytes)
                    .expect(STATE_CRUD_ERROR);
                delegate
            })
    }

    /// Mutable handle on a registered delegate, pulled into the overlay
    fn delegate_mut(&mut self, address: &Address) -> Option<&mut Delegate> {
        if !self.dirty.contains_key(address) {
            let loaded = self.load(address)?;
            self.dirty.insert(*address, loaded);
        }
        self.dirty.get_mut(address)
    }

    fn is_name_taken(&self, name: &str) -> bool {
        self.get_delegates()
            .iter()
            .any(|delegate| delegate.name == name)
    }
}

impl DelegateState for DelegateRegistry {
    fn get_delegate(&self, address: &Address) -> Option<Delegate> {
        match self.dirty.get(address) {
            Some(delegate) => Some(delegate.clone()),
            None => self.load(address),
        }
    }

    fn register(&mut self, address: &Address, name: &str, at_block: u64) -> bool {
        if !Delegate::is_valid_name(name)
            || self.is_registered(address)
            || self.is_name_taken(name)
        {
            return false;
        }
        self.dirty.insert(
            *address,
            Delegate {
                address: *address,
                name: name.to_string(),
                votes: Amount::zero(),
                registered_at: at_block,
            },
        );
        self.added.push(*address);
        debug!("registered delegate {} as {}", address, name);
        true
    }

    fn add_vote(&mut self, voter: &Address, delegate: &Address, amount: Amount) -> bool {
        let outstanding = self.vote_of(voter, delegate);
        let new_outstanding = match outstanding.checked_add(amount) {
            Some(total) => total,
            None => return false,
        };
        let record = match self.delegate_mut(delegate) {
            Some(record) => record,
            None => return false,
        };
        record.votes = match record.votes.checked_add(amount) {
            Some(total) => total,
            None => return false,
        };
        self.dirty_votes
            .insert((*voter, *delegate), new_outstanding);
        true
    }

    fn remove_vote(&mut self, voter: &Address, delegate: &Address, amount: Amount) -> bool {
        let outstanding = self.vote_of(voter, delegate);
        let new_outstanding = match outstanding.checked_sub(amount) {
            Some(rest) => rest,
            None => return false,
        };
        let record = match self.delegate_mut(delegate) {
            Some(record) => record,
            None => return false,
        };
        record.votes = record.votes.saturating_sub(amount);
        self.dirty_votes
            .insert((*voter, *delegate), new_outstanding);
        true
    }

    fn vote_of(&self, voter: &Address, delegate: &Address) -> Amount {
        if let Some(amount) = self.dirty_votes.get(&(*voter, *delegate)) {
            return *amount;
        }
        match self
            .db
            .get(StoreName::Vote, &Self::vote_key(voter, delegate))
        {
            Some(bytes) => {
                let (_, raw) = U64BEDeserializer::new(Included(u64::MIN), Included(u64::MAX))
                    .deserialize::<DeserializeError>(&bytes)
                    .expect(STATE_CRUD_ERROR);
                Amount::from_raw(raw)
            }
            None => Amount::zero(),
        }
    }

    fn get_delegates(&self) -> Vec<Delegate> {
        let mut delegates: BTreeMap<Address, Delegate> = BTreeMap::new();
        let address_deserializer = AddressDeserializer::new();
        for ordinal in 0..self.stored_count() {
            let key = Self::ordinal_key(ordinal);
            let bytes = self
                .db
                .get(StoreName::Delegate, &key)
                .expect(STATE_CRUD_ERROR);
            let (_, address) = address_deserializer
                .deserialize::<DeserializeError>(&bytes)
                .expect(STATE_CRUD_ERROR);
            let delegate = self.load(&address).expect(STATE_CRUD_ERROR);
            delegates.insert(address, delegate);
        }
        // the overlay supersedes stored records and adds fresh registrations
        for (address, delegate) in &self.dirty {
            delegates.insert(*address, delegate.clone());
        }
        let mut ranked: Vec<Delegate> = delegates.into_values().collect();
        ranked.sort_by(|a, b| {
            b.votes
                .cmp(&a.votes)
                .then_with(|| a.address.to_bytes().cmp(b.address.to_bytes()))
        });
        ranked
    }

    fn commit(&mut self, batch: &mut DbBatch) {
        let u32_serializer = U32BESerializer::new();
        let u64_serializer = U64BESerializer::new();
        let address_serializer = AddressSerializer::new();
        let mut count = self.stored_count();
        for address in std::mem::take(&mut self.added) {
            let mut key_bytes = Vec::new();
            address_serializer
                .serialize(&address, &mut key_bytes)
                .expect(STATE_CRUD_ERROR);
            batch.put(StoreName::Delegate, &Self::ordinal_key(count), key_bytes);
            count += 1;
        }
        let mut count_bytes = Vec::new();
        u32_serializer
            .serialize(&count, &mut count_bytes)
            .expect(STATE_CRUD_ERROR);
        batch.put(StoreName::Delegate, COUNT_KEY, count_bytes);
        for (address, delegate) in std::mem::take(&mut self.dirty) {
            let mut bytes = Vec::new();
            self.delegate_serializer
                .serialize(&delegate, &mut bytes)
                .expect(STATE_CRUD_ERROR);
            batch.put(StoreName::Delegate, address.to_bytes(), bytes);
        }
        for ((voter, delegate), amount) in std::mem::take(&mut self.dirty_votes) {
            let mut bytes = Vec::new();
            u64_serializer
                .serialize(&amount.to_raw(), &mut bytes)
                .expect(STATE_CRUD_ERROR);
            batch.put(StoreName::Vote, &Self::vote_key(&voter, &delegate), bytes);
        }
    }
}
