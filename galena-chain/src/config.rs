// Copyright (c) 2022 MASSA LABS <info@massa.net>

use galena_models::Amount;
use serde::{Deserialize, Serialize};

/// Ledger core configuration, injected at construction. Every
/// height-dependent rule is derived from this struct, never from globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// maximum number of transactions per block
    pub max_block_size: u32,
    /// minimum fee of any non-coinbase transaction
    pub min_transaction_fee: Amount,
    /// minimum fee of a delegate registration
    pub min_delegate_fee: Amount,
    /// height ceiling past which this node version refuses to append
    pub mandatory_upgrade: u64,
    /// validator rotation interval, in blocks
    pub validator_term: u64,
    /// hard cap on the validator set size
    pub max_validators: usize,
    /// validator set size at genesis
    pub initial_validators: usize,
    /// every this many blocks, one more validator slot opens
    pub validator_growth_period: u64,
    /// newly issued reward per block, before the emission end
    pub base_block_reward: Amount,
    /// height after which no new coins are issued
    pub reward_end_height: u64,
    /// maximum size of a block header's extra data, in bytes
    pub max_extra_data_size: u32,
}

impl ChainConfig {
    /// Newly issued coins for the block at `number`, excluding fees
    pub fn block_reward(&self, number: u64) -> Amount {
        if number > self.reward_end_height {
            Amount::zero()
        } else {
            self.base_block_reward
        }
    }

    /// Maximum validator count at height `number`: the initial size plus
    /// one slot per elapsed growth period, capped at `max_validators`
    pub fn number_of_validators(&self, number: u64) -> usize {
        let grown = self
            .initial_validators
            .saturating_add((number / self.validator_growth_period) as usize);
        grown.min(self.max_validators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn config() -> ChainConfig {
        ChainConfig {
            max_block_size: 100,
            min_transaction_fee: Amount::from_raw(1),
            min_delegate_fee: Amount::from_raw(10),
            mandatory_upgrade: 1_000_000,
            validator_term: 10,
            max_validators: 21,
            initial_validators: 4,
            validator_growth_period: 1_000,
            base_block_reward: Amount::from_raw(50),
            reward_end_height: 100_000,
            max_extra_data_size: 256,
        }
    }

    #[test]
    #[serial]
    fn test_reward_stops_after_emission_end() {
        let config = config();
        assert_eq!(config.block_reward(1), Amount::from_raw(50));
        assert_eq!(config.block_reward(100_000), Amount::from_raw(50));
        assert_eq!(config.block_reward(100_001), Amount::zero());
    }

    #[test]
    #[serial]
    fn test_validator_count_grows_and_caps() {
        let config = config();
        assert_eq!(config.number_of_validators(0), 4);
        assert_eq!(config.number_of_validators(999), 4);
        assert_eq!(config.number_of_validators(1_000), 5);
        assert_eq!(config.number_of_validators(1_000_000), 21);
    }
}
