// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Stateful application of transactions to account and delegate state.
//!
//! Executing a transaction checks its preconditions against live state; on
//! any failure the result is `success = false` and state is left untouched.
//! Fees accrue to the block producer for every included transaction
//! regardless of its execution outcome, so a failed transaction still pays
//! for its inclusion through the coinbase accounting in the append path.

use crate::config::ChainConfig;
use galena_models::{SignedTransaction, TransactionResult, TransactionType};
use galena_state::{AccountState, Delegate, DelegateState};
use tracing::debug;

/// Applies the transactions of one block, in order, against the live state
pub(crate) struct TransactionExecutor<'a> {
    config: &'a ChainConfig,
    accounts: &'a mut dyn AccountState,
    delegates: &'a mut dyn DelegateState,
}

impl<'a> TransactionExecutor<'a> {
    pub(crate) fn new(
        config: &'a ChainConfig,
        accounts: &'a mut dyn AccountState,
        delegates: &'a mut dyn DelegateState,
    ) -> Self {
        Self {
            config,
            accounts,
            delegates,
        }
    }

    /// Execute one transaction inside the block at `block_number`,
    /// producing its positionally aligned result
    pub(crate) fn execute(
        &mut self,
        transaction: &SignedTransaction,
        block_number: u64,
    ) -> TransactionResult {
        match self.apply(transaction, block_number) {
            Ok(()) => TransactionResult::success(),
            Err(reason) => {
                debug!(
                    "transaction {} rejected by execution: {}",
                    transaction.id, reason
                );
                TransactionResult::failure()
            }
        }
    }

    fn apply(
        &mut self,
        transaction: &SignedTransaction,
        block_number: u64,
    ) -> Result<(), &'static str> {
        let tx = &transaction.content;
        if tx.tx_type == TransactionType::Coinbase {
            // validation keeps coinbase transactions out of block bodies
            return Err("coinbase transaction in a block body");
        }
        if tx.fee < self.config.min_transaction_fee {
            return Err("fee below the transaction fee floor");
        }
        let sender = self.accounts.get_account(&tx.from);
        if tx.nonce != sender.nonce {
            return Err("nonce does not match the sender's account");
        }
        let charge = tx
            .value
            .checked_add(tx.fee)
            .ok_or("value + fee overflows")?;
        match tx.tx_type {
            TransactionType::Transfer => {
                let remaining = sender
                    .balance
                    .checked_sub(charge)
                    .ok_or("balance below value + fee")?;
                self.accounts.account_mut(&tx.from).balance = remaining;
                let recipient = self.accounts.account_mut(&tx.to);
                recipient.balance = recipient.balance.saturating_add(tx.value);
            }
            TransactionType::DelegateRegister => {
                if tx.fee < self.config.min_delegate_fee {
                    return Err("fee below the delegate registration floor");
                }
                let remaining = sender
                    .balance
                    .checked_sub(charge)
                    .ok_or("balance below value + fee")?;
                let name = std::str::from_utf8(&tx.data)
                    .map_err(|_| "delegate name is not valid utf-8")?;
                if !Delegate::is_valid_name(name) {
                    return Err("delegate name breaks the naming rule");
                }
                if !self.delegates.register(&tx.from, name, block_number) {
                    return Err("address or delegate name already registered");
                }
                self.accounts.account_mut(&tx.from).balance = remaining;
            }
            TransactionType::DelegateVote => {
                let remaining = sender
                    .balance
                    .checked_sub(charge)
                    .ok_or("balance below value + fee")?;
                if !self.delegates.add_vote(&tx.from, &tx.to, tx.value) {
                    return Err("recipient is not a registered delegate");
                }
                self.accounts.account_mut(&tx.from).balance = remaining;
            }
            TransactionType::DelegateUnvote => {
                let remaining = sender
                    .balance
                    .checked_sub(tx.fee)
                    .ok_or("balance below fee")?;
                if !self.delegates.remove_vote(&tx.from, &tx.to, tx.value) {
                    return Err("withdrawal exceeds the outstanding vote");
                }
                self.accounts.account_mut(&tx.from).balance =
                    remaining.saturating_add(tx.value);
            }
            TransactionType::Coinbase => unreachable!("rejected above"),
        }
        self.accounts.account_mut(&tx.from).nonce = tx.nonce + 1;
        Ok(())
    }
}
