// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Shared fixtures for the ledger core scenarios: an in-memory chain seeded
//! with a premined holder account and one registered forger delegate, plus
//! block and transaction forging helpers.

use crate::{Blockchain, ChainConfig, GenesisSpec};
use galena_db::MemoryDatabase;
use galena_hash::Hash;
use galena_models::{
    results_root, transactions_root, Address, Amount, Block, BlockHeader, BlockHeaderSerializer,
    Id, SignedContent, SignedTransaction, Transaction, TransactionResult, TransactionSerializer,
    TransactionType,
};
use galena_signature::KeyPair;
use galena_state::{AccountLedger, DelegateRegistry};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Balance premined to both seeded accounts
pub const PREMINE: u64 = 1_000_000;

pub struct ChainSetup {
    pub db: Arc<MemoryDatabase>,
    pub chain: Blockchain,
    pub spec: GenesisSpec,
    pub forger: KeyPair,
    pub forger_address: Address,
    pub holder: KeyPair,
    pub holder_address: Address,
}

pub fn default_config() -> ChainConfig {
    ChainConfig {
        max_block_size: 100,
        min_transaction_fee: Amount::from_raw(1),
        min_delegate_fee: Amount::from_raw(10),
        mandatory_upgrade: u64::MAX,
        validator_term: 10,
        max_validators: 21,
        initial_validators: 4,
        validator_growth_period: 1_000,
        base_block_reward: Amount::from_raw(50),
        reward_end_height: u64::MAX,
        max_extra_data_size: 256,
    }
}

/// Open a chain over `db` with fresh state views, bootstrapping on first use
pub fn open_chain(config: ChainConfig, db: Arc<MemoryDatabase>, spec: &GenesisSpec) -> Blockchain {
    Blockchain::new(
        config,
        db.clone(),
        Box::new(AccountLedger::new(db.clone())),
        Box::new(DelegateRegistry::new(db)),
        spec,
    )
    .unwrap()
}

/// Fresh chain over a fresh in-memory store: `holder` and `forger` each hold
/// [`PREMINE`], and `forger` is the sole genesis delegate (so the sole
/// initial validator)
pub fn setup_chain(config: ChainConfig) -> ChainSetup {
    let db = Arc::new(MemoryDatabase::new());
    let forger = KeyPair::generate();
    let forger_address = Address::from_public_key(&forger.get_public_key());
    let holder = KeyPair::generate();
    let holder_address = Address::from_public_key(&holder.get_public_key());
    let spec = GenesisSpec {
        timestamp: 1_600_000_000_000,
        extra_data: vec![],
        premine: BTreeMap::from([
            (holder_address, Amount::from_raw(PREMINE)),
            (forger_address, Amount::from_raw(PREMINE)),
        ]),
        delegates: BTreeMap::from([("forger_01".to_string(), forger_address)]),
    };
    let chain = open_chain(config, db.clone(), &spec);
    ChainSetup {
        db,
        chain,
        spec,
        forger,
        forger_address,
        holder,
        holder_address,
    }
}

pub fn make_transaction(
    keypair: &KeyPair,
    tx_type: TransactionType,
    to: Address,
    value: u64,
    fee: u64,
    nonce: u64,
    data: Vec<u8>,
) -> SignedTransaction {
    let content = Transaction {
        tx_type,
        from: Address::from_public_key(&keypair.get_public_key()),
        to,
        value: Amount::from_raw(value),
        fee: Amount::from_raw(fee),
        nonce,
        timestamp: 0,
        data,
    };
    Transaction::new_signed(content, TransactionSerializer::new(), keypair).unwrap()
}

pub fn make_transfer(
    keypair: &KeyPair,
    to: Address,
    value: u64,
    fee: u64,
    nonce: u64,
) -> SignedTransaction {
    make_transaction(keypair, TransactionType::Transfer, to, value, fee, nonce, vec![])
}

/// Forge a fully explicit block: `results` is what the producer claims, the
/// roots commit to the arguments as given
pub fn forge_block(
    keypair: &KeyPair,
    number: u64,
    prev_hash: Hash,
    transactions: Vec<SignedTransaction>,
    results: Vec<TransactionResult>,
) -> Block {
    let header = BlockHeader {
        number,
        coinbase: Address::from_public_key(&keypair.get_public_key()),
        prev_hash,
        timestamp: 1_600_000_000_000 + number,
        transactions_root: transactions_root(&transactions),
        results_root: results_root(&results).unwrap(),
        state_root: Hash::zero(),
        extra_data: vec![],
    };
    Block {
        header: BlockHeader::new_signed(header, BlockHeaderSerializer::new(), keypair).unwrap(),
        transactions,
        results,
    }
}

/// Forge the successor of the chain's latest block, claiming success for
/// every carried transaction
pub fn next_block(
    chain: &Blockchain,
    keypair: &KeyPair,
    transactions: Vec<SignedTransaction>,
) -> Block {
    let results = transactions
        .iter()
        .map(|_| TransactionResult::success())
        .collect();
    forge_block(
        keypair,
        chain.latest_block_number() + 1,
        chain.latest_block_hash().get_hash(),
        transactions,
        results,
    )
}
