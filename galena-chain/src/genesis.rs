// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::ChainError;
use galena_hash::Hash;
use galena_models::{
    results_root, transactions_root, Address, Amount, Block, BlockHeader, BlockHeaderSerializer,
    SignedContent,
};
use galena_signature::KeyPair;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Preimage of the seed of the keypair signing the genesis header. Deriving
/// the key from a fixed constant keeps the genesis hash identical across
/// independent nodes.
const GENESIS_KEY_SEED: &[u8] = b"galena genesis signing key";

/// Frozen definition of block 0: initial balances and the initial delegate
/// roster. Loadable from a JSON file so networks can ship their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisSpec {
    /// genesis timestamp, in milliseconds
    pub timestamp: u64,
    /// free-form payload of the genesis header
    #[serde(default)]
    pub extra_data: Vec<u8>,
    /// initial balance allocations, applied once at first-run bootstrap
    pub premine: BTreeMap<Address, Amount>,
    /// initial delegate roster, name → address
    pub delegates: BTreeMap<String, Address>,
}

impl GenesisSpec {
    /// Load a genesis definition from a JSON file
    pub fn from_file(path: &Path) -> Result<GenesisSpec, ChainError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| ChainError::Genesis(format!("cannot read {:?}: {}", path, err)))?;
        serde_json::from_str(&raw)
            .map_err(|err| ChainError::Genesis(format!("cannot parse {:?}: {}", path, err)))
    }

    /// Build the frozen block 0 from this definition. The block is signed
    /// with the fixed-seed genesis key, carries no transactions, and links
    /// to the zero hash; it is reconstructed in memory on every lookup and
    /// never persisted as an ordinary block.
    pub fn build(&self) -> Result<Block, ChainError> {
        let keypair = KeyPair::from_bytes(&Hash::compute_from(GENESIS_KEY_SEED).into_bytes())
            .map_err(|err| ChainError::Genesis(format!("cannot derive genesis key: {}", err)))?;
        let header = BlockHeader {
            number: 0,
            coinbase: Address::from_public_key(&keypair.get_public_key()),
            prev_hash: Hash::zero(),
            timestamp: self.timestamp,
            transactions_root: transactions_root(&[]),
            results_root: results_root(&[])?,
            state_root: Hash::zero(),
            extra_data: self.extra_data.clone(),
        };
        Ok(Block {
            header: BlockHeader::new_signed(header, BlockHeaderSerializer::new(), &keypair)?,
            transactions: vec![],
            results: vec![],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galena_signature::KeyPair;
    use serial_test::serial;
    use std::io::Write;

    fn sample_spec() -> GenesisSpec {
        let holder = Address::from_public_key(&KeyPair::generate().get_public_key());
        let forger = Address::from_public_key(&KeyPair::generate().get_public_key());
        GenesisSpec {
            timestamp: 1_600_000_000_000,
            extra_data: vec![],
            premine: BTreeMap::from([(holder, Amount::from_raw(1_000_000))]),
            delegates: BTreeMap::from([("forger_01".to_string(), forger)]),
        }
    }

    #[test]
    #[serial]
    fn test_genesis_hash_is_reproducible() {
        let spec = sample_spec();
        let a = spec.build().unwrap();
        let b = spec.build().unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.number(), 0);
        assert_eq!(a.header.content.prev_hash, Hash::zero());
        a.header.verify_signature().unwrap();
    }

    #[test]
    #[serial]
    fn test_spec_round_trips_through_json_file() {
        let spec = sample_spec();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&spec).unwrap().as_bytes())
            .unwrap();
        let loaded = GenesisSpec::from_file(file.path()).unwrap();
        assert_eq!(loaded.timestamp, spec.timestamp);
        assert_eq!(loaded.premine, spec.premine);
        assert_eq!(loaded.delegates, spec.delegates);
        assert_eq!(loaded.build().unwrap().id(), spec.build().unwrap().id());
    }

    #[test]
    #[serial]
    fn test_missing_file_is_a_genesis_error() {
        let err = GenesisSpec::from_file(Path::new("/nonexistent/genesis.json")).unwrap_err();
        assert!(matches!(err, ChainError::Genesis(_)));
    }
}
