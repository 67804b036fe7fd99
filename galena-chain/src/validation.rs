// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Pure structural validation of blocks and transactions.
//!
//! These predicates are side-effect free and independent of chain state:
//! balance, nonce and fee-floor checks are a separate stateful concern
//! applied by the executor. Any violation rejects the input before the
//! ledger core mutates anything.

use crate::config::ChainConfig;
use crate::error::ValidationError;
use galena_models::{
    results_root, transactions_root, Block, SignedTransaction, TransactionType,
    MAX_TRANSACTION_DATA_SIZE,
};

/// Check the chain-state-independent validity of one transaction:
/// the type must be allowed in a block body, the data payload must fit the
/// cap, `value + fee` must be representable, the signature must verify
/// against the content hash, and the signer's derived address must be the
/// declared sender.
pub fn check_transaction(transaction: &SignedTransaction) -> Result<(), ValidationError> {
    if transaction.content.tx_type == TransactionType::Coinbase {
        return Err(ValidationError::CoinbaseInBody(transaction.id));
    }
    if transaction.content.data.len() > MAX_TRANSACTION_DATA_SIZE as usize {
        return Err(ValidationError::DataTooLarge(
            transaction.id,
            transaction.content.data.len(),
            MAX_TRANSACTION_DATA_SIZE,
        ));
    }
    if transaction
        .content
        .value
        .checked_add(transaction.content.fee)
        .is_none()
    {
        return Err(ValidationError::ValueFeeOverflow(transaction.id));
    }
    transaction
        .verify_signature()
        .map_err(|_| ValidationError::InvalidTransactionSignature(transaction.id))?;
    if transaction.creator_address() != transaction.content.from {
        return Err(ValidationError::SignerSenderMismatch(transaction.id));
    }
    Ok(())
}

/// Check the structural validity of a block: aligned result list, size caps,
/// header signature by the coinbase key, stored merkle roots matching the
/// recomputed ones, and every contained transaction passing
/// [`check_transaction`]. Chain linkage (`prev_hash`) is checked by the
/// append path where the latest block is known; `state_root` re-execution is
/// delegated to an outer consensus stage.
pub fn check_block(config: &ChainConfig, block: &Block) -> Result<(), ValidationError> {
    let id = block.id();
    if block.transactions.len() != block.results.len() {
        return Err(ValidationError::ResultCountMismatch {
            id,
            transactions: block.transactions.len(),
            results: block.results.len(),
        });
    }
    if block.transactions.len() > config.max_block_size as usize {
        return Err(ValidationError::TooManyTransactions(
            id,
            block.transactions.len(),
            config.max_block_size,
        ));
    }
    if block.header.content.extra_data.len() > config.max_extra_data_size as usize {
        return Err(ValidationError::ExtraDataTooLarge(
            id,
            block.header.content.extra_data.len(),
            config.max_extra_data_size,
        ));
    }
    block
        .header
        .verify_signature()
        .map_err(|_| ValidationError::InvalidHeaderSignature(id))?;
    if block.header.creator_address() != block.header.content.coinbase {
        return Err(ValidationError::SignerCoinbaseMismatch(id));
    }
    if transactions_root(&block.transactions) != block.header.content.transactions_root {
        return Err(ValidationError::TransactionsRootMismatch { id });
    }
    if results_root(&block.results)? != block.header.content.results_root {
        return Err(ValidationError::ResultsRootMismatch { id });
    }
    for transaction in &block.transactions {
        check_transaction(transaction)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use galena_hash::Hash;
    use galena_models::{
        Address, Amount, BlockHeader, BlockHeaderSerializer, SignedContent, Transaction,
        TransactionResult, TransactionSerializer,
    };
    use galena_signature::KeyPair;
    use serial_test::serial;

    fn config() -> ChainConfig {
        ChainConfig {
            max_block_size: 2,
            min_transaction_fee: Amount::from_raw(1),
            min_delegate_fee: Amount::from_raw(10),
            mandatory_upgrade: u64::MAX,
            validator_term: 10,
            max_validators: 21,
            initial_validators: 4,
            validator_growth_period: 1_000,
            base_block_reward: Amount::from_raw(50),
            reward_end_height: u64::MAX,
            max_extra_data_size: 8,
        }
    }

    fn signed_transfer(keypair: &KeyPair, tx_type: TransactionType) -> SignedTransaction {
        let content = Transaction {
            tx_type,
            from: Address::from_public_key(&keypair.get_public_key()),
            to: Address::ZERO,
            value: Amount::from_raw(5),
            fee: Amount::from_raw(1),
            nonce: 0,
            timestamp: 0,
            data: vec![],
        };
        Transaction::new_signed(content, TransactionSerializer::new(), keypair).unwrap()
    }

    fn build_block(keypair: &KeyPair, transactions: Vec<SignedTransaction>) -> Block {
        let results: Vec<TransactionResult> = transactions
            .iter()
            .map(|_| TransactionResult::success())
            .collect();
        let header = BlockHeader {
            number: 1,
            coinbase: Address::from_public_key(&keypair.get_public_key()),
            prev_hash: Hash::zero(),
            timestamp: 0,
            transactions_root: transactions_root(&transactions),
            results_root: results_root(&results).unwrap(),
            state_root: Hash::zero(),
            extra_data: vec![],
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
    fn test_valid_block_passes() {
        let keypair = KeyPair::generate();
        let block = build_block(
            &keypair,
            vec![signed_transfer(&keypair, TransactionType::Transfer)],
        );
        check_block(&config(), &block).unwrap();
    }

    #[test]
    #[serial]
    fn test_coinbase_in_body_rejected() {
        let keypair = KeyPair::generate();
        let tx = signed_transfer(&keypair, TransactionType::Coinbase);
        assert!(matches!(
            check_transaction(&tx),
            Err(ValidationError::CoinbaseInBody(_))
        ));
    }

    #[test]
    #[serial]
    fn test_oversized_data_rejected() {
        let keypair = KeyPair::generate();
        let content = Transaction {
            tx_type: TransactionType::Transfer,
            from: Address::from_public_key(&keypair.get_public_key()),
            to: Address::ZERO,
            value: Amount::from_raw(5),
            fee: Amount::from_raw(1),
            nonce: 0,
            timestamp: 0,
            data: vec![0u8; MAX_TRANSACTION_DATA_SIZE as usize + 1],
        };
        let tx: SignedTransaction =
            Transaction::new_signed(content, TransactionSerializer::new(), &keypair).unwrap();
        assert!(matches!(
            check_transaction(&tx),
            Err(ValidationError::DataTooLarge(..))
        ));
    }

    #[test]
    #[serial]
    fn test_signer_sender_mismatch_rejected() {
        let keypair = KeyPair::generate();
        let content = Transaction {
            tx_type: TransactionType::Transfer,
            // declared sender differs from the signing key's address
            from: Address::ZERO,
            to: Address::ZERO,
            value: Amount::from_raw(5),
            fee: Amount::from_raw(1),
            nonce: 0,
            timestamp: 0,
            data: vec![],
        };
        let tx: SignedTransaction =
            Transaction::new_signed(content, TransactionSerializer::new(), &keypair).unwrap();
        assert!(matches!(
            check_transaction(&tx),
            Err(ValidationError::SignerSenderMismatch(_))
        ));
    }

    #[test]
    #[serial]
    fn test_value_fee_overflow_rejected() {
        let keypair = KeyPair::generate();
        let content = Transaction {
            tx_type: TransactionType::Transfer,
            from: Address::from_public_key(&keypair.get_public_key()),
            to: Address::ZERO,
            value: Amount::from_raw(u64::MAX),
            fee: Amount::from_raw(1),
            nonce: 0,
            timestamp: 0,
            data: vec![],
        };
        let tx: SignedTransaction =
            Transaction::new_signed(content, TransactionSerializer::new(), &keypair).unwrap();
        assert!(matches!(
            check_transaction(&tx),
            Err(ValidationError::ValueFeeOverflow(_))
        ));
    }

    #[test]
    #[serial]
    fn test_tampered_transaction_list_breaks_root() {
        let keypair = KeyPair::generate();
        let mut block = build_block(
            &keypair,
            vec![signed_transfer(&keypair, TransactionType::Transfer)],
        );
        // swap in a transaction the header never committed to
        block.transactions[0] = signed_transfer(&KeyPair::generate(), TransactionType::Transfer);
        assert!(matches!(
            check_block(&config(), &block),
            Err(ValidationError::TransactionsRootMismatch { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_tampered_results_break_root() {
        let keypair = KeyPair::generate();
        let mut block = build_block(
            &keypair,
            vec![signed_transfer(&keypair, TransactionType::Transfer)],
        );
        block.results[0] = TransactionResult::failure();
        assert!(matches!(
            check_block(&config(), &block),
            Err(ValidationError::ResultsRootMismatch { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_result_count_mismatch_rejected() {
        let keypair = KeyPair::generate();
        let mut block = build_block(
            &keypair,
            vec![signed_transfer(&keypair, TransactionType::Transfer)],
        );
        block.results.push(TransactionResult::success());
        assert!(matches!(
            check_block(&config(), &block),
            Err(ValidationError::ResultCountMismatch { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_block_over_size_cap_rejected() {
        let keypair = KeyPair::generate();
        let block = build_block(
            &keypair,
            vec![
                signed_transfer(&keypair, TransactionType::Transfer),
                signed_transfer(&keypair, TransactionType::Transfer),
                signed_transfer(&keypair, TransactionType::Transfer),
            ],
        );
        assert!(matches!(
            check_block(&config(), &block),
            Err(ValidationError::TooManyTransactions(..))
        ));
    }

    #[test]
    #[serial]
    fn test_header_signed_by_other_key_rejected() {
        let producer = KeyPair::generate();
        let imposter = KeyPair::generate();
        let header = BlockHeader {
            number: 1,
            coinbase: Address::from_public_key(&producer.get_public_key()),
            prev_hash: Hash::zero(),
            timestamp: 0,
            transactions_root: transactions_root(&[]),
            results_root: results_root(&[]).unwrap(),
            state_root: Hash::zero(),
            extra_data: vec![],
        };
        let block = Block {
            header: BlockHeader::new_signed(header, BlockHeaderSerializer::new(), &imposter)
                .unwrap(),
            transactions: vec![],
            results: vec![],
        };
        assert!(matches!(
            check_block(&config(), &block),
            Err(ValidationError::SignerCoinbaseMismatch(_))
        ));
    }
}
