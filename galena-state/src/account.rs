// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::STATE_CRUD_ERROR;
use galena_db::{Database, DbBatch, StoreName};
use galena_models::{Address, Amount, AmountDeserializer, AmountSerializer};
use galena_serialization::{
    DeserializeError, Deserializer, SerializeError, Serializer, U64BEDeserializer, U64BESerializer,
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

/// Balance and replay counter of one address. The address itself is the
/// storage key and is not repeated in the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// spendable balance
    pub balance: Amount,
    /// next expected transaction nonce
    pub nonce: u64,
}

/// Serializer for `Account`
#[derive(Clone, Default)]
pub struct AccountSerializer {
    amount_serializer: AmountSerializer,
    u64_serializer: U64BESerializer,
}

impl AccountSerializer {
    /// Creates a new `AccountSerializer`
    pub const fn new() -> Self {
        Self {
            amount_serializer: AmountSerializer::new(),
            u64_serializer: U64BESerializer::new(),
        }
    }
}

impl Serializer<Account> for AccountSerializer {
    fn serialize(&self, value: &Account, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.amount_serializer.serialize(&value.balance, buffer)?;
        self.u64_serializer.serialize(&value.nonce, buffer)?;
        Ok(())
    }
}

/// Deserializer for `Account`
#[derive(Clone)]
pub struct AccountDeserializer {
    amount_deserializer: AmountDeserializer,
    u64_deserializer: U64BEDeserializer,
}

impl AccountDeserializer {
    /// Creates a new `AccountDeserializer`
    pub const fn new() -> Self {
        Self {
            amount_deserializer: AmountDeserializer::new(Included(u64::MIN), Included(u64::MAX)),
            u64_deserializer: U64BEDeserializer::new(Included(u64::MIN), Included(u64::MAX)),
        }
    }
}

impl Default for AccountDeserializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deserializer<Account> for AccountDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], Account, E> {
        context(
            "Failed Account deserialization",
            tuple((
                context("Failed balance deserialization", |input| {
                    self.amount_deserializer.deserialize(input)
                }),
                context("Failed nonce deserialization", |input| {
                    self.u64_deserializer.deserialize(input)
                }),
            )),
        )
        .map(|(balance, nonce)| Account { balance, nonce })
        .parse(buffer)
    }
}

/// Capability trait over account state: zero-default reads, in-place
/// mutation, and batch-staged commit
pub trait AccountState: Send + Sync {
    /// Current entry of `address`, a zero-value default if never touched
    fn get_account(&self, address: &Address) -> Account;

    /// Mutable entry of `address`, created with zero-value defaults when
    /// absent. The mutation becomes durable at the next `commit`.
    fn account_mut(&mut self, address: &Address) -> &mut Account;

    /// Stage every entry mutated since the last commit into `batch`
    fn commit(&mut self, batch: &mut DbBatch);
}

/// KV-backed account state: reads check the dirty overlay first, then the
/// Account namespace of the backing store
pub struct AccountLedger {
    db: Arc<dyn Database>,
    account_serializer: AccountSerializer,
    account_deserializer: AccountDeserializer,
    dirty: BTreeMap<Address, Account>,
}

impl AccountLedger {
    /// Creates an account ledger over `db`
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            account_serializer: AccountSerializer::new(),
            account_deserializer: AccountDeserializer::new(),
            dirty: BTreeMap::new(),
        }
    }

    fn load(&self, address: &Address) -> Account {
        match self.db.get(StoreName::Account, address.to_bytes()) {
            Some(bytes) => {
                let (_, account) = self
                    .account_deserializer
                    .deserialize::<DeserializeError>(&bytes)
                    .expect(STATE_CRUD_ERROR);
                account
            }
            None => Account::default(),
        }
    }
}

impl AccountState for AccountLedger {
    fn get_account(&self, address: &Address) -> Account {
        match self.dirty.get(address) {
            Some(account) => *account,
            None => self.load(address),
        }
    }

    fn account_mut(&mut self, address: &Address) -> &mut Account {
        if !self.dirty.contains_key(address) {
            let loaded = self.load(address);
            self.dirty.insert(*address, loaded);
        }
        self.dirty
            .get_mut(address)
            .expect("entry inserted just above")
    }

    fn commit(&mut self, batch: &mut DbBatch) {
        for (address, account) in std::mem::take(&mut self.dirty) {
            let mut bytes = Vec::new();
            self.account_serializer
                .serialize(&account, &mut bytes)
                .expect(STATE_CRUD_ERROR);
            batch.put(StoreName::Account, address.to_bytes(), bytes);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galena_db::MemoryDatabase;
    use galena_signature::KeyPair;
    use serial_test::serial;

    fn test_address() -> Address {
        Address::from_public_key(&KeyPair::generate().get_public_key())
    }

    #[test]
    #[serial]
    fn test_absent_account_is_zero_default() {
        let ledger = AccountLedger::new(Arc::new(MemoryDatabase::new()));
        let account = ledger.get_account(&test_address());
        assert_eq!(account.balance, Amount::zero());
        assert_eq!(account.nonce, 0);
    }

    #[test]
    #[serial]
    fn test_mutation_visible_before_commit() {
        let mut ledger = AccountLedger::new(Arc::new(MemoryDatabase::new()));
        let address = test_address();
        ledger.account_mut(&address).balance = Amount::from_raw(500);
        assert_eq!(ledger.get_account(&address).balance, Amount::from_raw(500));
    }

    #[test]
    #[serial]
    fn test_commit_stages_into_batch_and_survives_reload() {
        let db = Arc::new(MemoryDatabase::new());
        let address = test_address();
        let mut ledger = AccountLedger::new(db.clone());
        {
            let account = ledger.account_mut(&address);
            account.balance = Amount::from_raw(77);
            account.nonce = 3;
        }
        let mut batch = DbBatch::new();
        ledger.commit(&mut batch);
        assert_eq!(batch.len(), 1);
        db.write_batch(batch);

        // a fresh ledger over the same store sees the committed entry
        let reloaded = AccountLedger::new(db);
        let account = reloaded.get_account(&address);
        assert_eq!(account.balance, Amount::from_raw(77));
        assert_eq!(account.nonce, 3);
    }

    #[test]
    #[serial]
    fn test_uncommitted_mutation_is_not_durable() {
        let db = Arc::new(MemoryDatabase::new());
        let address = test_address();
        let mut ledger = AccountLedger::new(db.clone());
        ledger.account_mut(&address).balance = Amount::from_raw(9);
        drop(ledger);
        let reloaded = AccountLedger::new(db);
        assert_eq!(reloaded.get_account(&address).balance, Amount::zero());
    }
}
