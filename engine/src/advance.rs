//! The stability advancer (`§4.6`): walks pending main-chain indices past
//! the stable frontier, gathers each MCI's newly-stable DAG blocks in
//! topological order, dispatches their transactions and approvals, and
//! finalises each block through the summariser before rotating witnesses.

use std::collections::HashSet;

use crate::cache::Cache;
use crate::config::NodeConfig;
use crate::error::{CResult, ChainError};
use crate::executor::precompiles::Precompiles;
use crate::executor::state::ExecutionState;
use crate::executor::{self, McInfo, Permanence};
use crate::store::{keys, ColumnFamily, Store};
use crate::summary::{self, StableContext};
use crate::trie;
use crate::types::{Approval, ApprovalReceipt, Block, BlockState, Hash, Receipt, Transaction};
use crate::vrf;
use crate::witness;

/// Runs `try_advance` until `advance_info.mci <= last_stable_mci`. Returns
/// the number of MCIs stabilised.
pub fn try_advance<S: Store, P: Precompiles>(
    cache: &mut Cache<S>,
    config: &NodeConfig,
    precompiles: &P,
) -> CResult<u64> {
    let (advance_mci, _witness_block): (u64, Hash) =
        cache.get(ColumnFamily::Metadata, b"advance_info")?.unwrap_or((0, Hash::zero()));
    let mut last_stable_mci: u64 = cache.get(ColumnFamily::Metadata, b"last_stable_mci")?.unwrap_or(0);
    let mut last_stable_index: u64 = cache.get(ColumnFamily::Metadata, b"last_stable_index")?.unwrap_or(0);
    let epoch_period: u64 = cache
        .get(ColumnFamily::Metadata, b"epoch_period")?
        .unwrap_or(config.epoch_period);

    let mut advanced = 0u64;

    while advance_mci > last_stable_mci {
        last_stable_mci += 1;
        let mci = last_stable_mci;

        let mc_block_hash: Hash = cache
            .get(ColumnFamily::MainChain, &keys::mci_key(mci))?
            .ok_or_else(|| ChainError::Invariant(format!("no main chain block at mci {mci}")))?;
        let mc_block: Block = cache
            .get(ColumnFamily::Block, &keys::hash_key(mc_block_hash))?
            .ok_or(ChainError::MissingBlock(mc_block_hash))?;

        let summary_anchor: BlockState = cache
            .get(ColumnFamily::BlockState, &keys::hash_key(mc_block.last_summary_block))?
            .ok_or(ChainError::MissingState(mc_block.last_summary_block))?;
        let mc_last_summary_mci =
            summary_anchor.main_chain_index.ok_or(ChainError::InvalidSummaryAnchor(mc_block.last_summary_block))?;

        let mc_timestamp = mc_block.exec_timestamp;
        let batch = collect_unstable_ancestors(cache, mc_block_hash)?;

        for s_hash in batch {
            last_stable_index += 1;
            let s_block: Block =
                cache.get(ColumnFamily::Block, &keys::hash_key(s_hash))?.ok_or(ChainError::MissingBlock(s_hash))?;

            let mc_info = McInfo { stable_index: last_stable_index, mci, mc_timestamp, mc_last_summary_mci };
            let mut receipt_rlps = Vec::with_capacity(s_block.links.len() + s_block.approves.len());
            let mut exec_state = ExecutionState::new();

            for (index, &txh) in s_block.links.iter().enumerate() {
                let receipt: Receipt = match cache.get(ColumnFamily::TransactionReceipt, &keys::hash_key(txh))? {
                    Some(existing) => existing,
                    None => {
                        let tx: Transaction = cache
                            .get(ColumnFamily::Transaction, &keys::hash_key(txh))?
                            .ok_or_else(|| ChainError::Invariant(format!("missing transaction {txh:#x}")))?;
                        let receipt = executor::execute_transaction(
                            cache,
                            &mut exec_state,
                            precompiles,
                            &tx,
                            mc_info,
                            Permanence::Committed,
                        )?;
                        cache.put(ColumnFamily::TransactionReceipt, &keys::hash_key(txh), &receipt)?;
                        cache.put(
                            ColumnFamily::TransactionAddress,
                            &keys::tx_address_key(txh),
                            &(s_hash, index as u64),
                        )?;
                        decrement_counter(cache, b"transaction_unstable_count")?;
                        receipt
                    }
                };
                receipt_rlps.push(rlp::encode(&receipt).to_vec());
            }

            for &aph in &s_block.approves {
                let approval: Approval = cache
                    .get(ColumnFamily::Approve, &keys::hash_key(aph))?
                    .ok_or_else(|| ChainError::Invariant(format!("missing approval {aph:#x}")))?;
                let receipt: ApprovalReceipt = match cache.get(ColumnFamily::ApproveReceipt, &keys::hash_key(aph))? {
                    Some(existing) => existing,
                    None => {
                        let seed = vrf::epoch_seed(cache, approval.epoch, epoch_period)?;
                        let output = vrf::derive_output(seed, &approval.signature);
                        let receipt = ApprovalReceipt { from: approval.from, output };
                        cache.put(ColumnFamily::ApproveReceipt, &keys::hash_key(aph), &receipt)?;
                        decrement_counter(cache, b"approve_unstable_count")?;
                        receipt
                    }
                };
                if approval.epoch == witness::epoch_of(mci, epoch_period) {
                    witness::record_vrf_output(cache, approval.epoch, &receipt)?;
                }
                receipt_rlps.push(rlp::encode(&receipt).to_vec());
            }

            let receipts_root = trie::ordered_trie_root(receipt_rlps);
            let stable_ctx = StableContext {
                mci,
                mc_timestamp,
                skiplist_mcis: summary::skip_list_mcis(mci, config.skiplist_divisor),
            };
            summary::set_block_stable(cache, &stable_ctx, s_hash, receipts_root, last_stable_index)?;
        }

        cache.put(ColumnFamily::Metadata, b"last_stable_mci", &last_stable_mci)?;
        cache.put(ColumnFamily::Metadata, b"last_stable_index", &last_stable_index)?;

        let last_stable_anchor: BlockState = cache
            .get(ColumnFamily::BlockState, &keys::hash_key(mc_block.last_stable_block))?
            .ok_or(ChainError::MissingState(mc_block.last_stable_block))?;
        let min_retrievable_mci = last_stable_anchor
            .main_chain_index
            .ok_or(ChainError::Invariant(format!("{:#x} is not yet on-main", mc_block.last_stable_block)))?;
        cache.put(ColumnFamily::Metadata, b"min_retrievable_mci", &min_retrievable_mci)?;

        witness::try_rotate_witnesses(cache, config, mc_last_summary_mci)?;

        // `§4.6`: "the loop checkpoints via the timeout-transaction
        // wrapper between iterations" -- one MCI step is one logical
        // write transaction.
        cache.checkpoint()?;

        advanced += 1;
    }

    Ok(advanced)
}

fn decrement_counter<S: Store>(cache: &mut Cache<S>, key: &[u8]) -> CResult<()> {
    let current: u64 = cache.get(ColumnFamily::Metadata, key)?.unwrap_or(0);
    cache.put(ColumnFamily::Metadata, key, &current.saturating_sub(1))
}

/// All unstable blocks reachable from `mc_block` by walking `parents`
/// (every parent, not just `best_parent`), stopping at already-stable
/// blocks since their own ancestors are necessarily stable too. Returned
/// in `(level asc, hash asc)` order, the topological order the stability
/// advancer processes a batch in (`§4.6` step 3).
fn collect_unstable_ancestors<S: Store>(cache: &mut Cache<S>, mc_block: Hash) -> CResult<Vec<Hash>> {
    let mut seen = HashSet::new();
    let mut stack = vec![mc_block];
    let mut found = Vec::new();

    while let Some(h) = stack.pop() {
        if !seen.insert(h) {
            continue;
        }
        let state: BlockState =
            cache.get(ColumnFamily::BlockState, &keys::hash_key(h))?.ok_or(ChainError::MissingState(h))?;
        if state.is_stable {
            continue;
        }
        found.push((state.level, h));

        let block: Block = cache.get(ColumnFamily::Block, &keys::hash_key(h))?.ok_or(ChainError::MissingBlock(h))?;
        stack.extend(block.parents);
    }

    found.sort();
    Ok(found.into_iter().map(|(_, h)| h).collect())
}

#[cfg(test)]
mod tests {
    use crate::executor::precompiles::StandardPrecompiles;
    use crate::store::memory::MemoryStore;
    use crate::types::{create_sentinel, Address};
    use crate::{dag, genesis, main_chain};

    use super::*;

    fn admit<S: Store>(cache: &mut Cache<S>, block: Block) -> CResult<()> {
        let hash = block.hash;
        dag::write_dag_block(cache, block)?;
        let last_mci: u64 = cache.get(ColumnFamily::Metadata, b"last_mci")?.unwrap_or(0);
        let last_stable_mci: u64 = cache.get(ColumnFamily::Metadata, b"last_stable_mci")?.unwrap_or(0);
        if let Some(change) = main_chain::find_main_chain_changes(cache, last_mci, last_stable_mci)? {
            crate::limci::update_latest_included_mci(cache, &change, hash)?;
            cache.put(ColumnFamily::Metadata, b"last_mci", &change.new_last_mci)?;
            cache.put(ColumnFamily::Metadata, b"advance_info", &(change.new_last_mci, hash))?;
        }
        Ok(())
    }

    fn child_block(from: Address, previous: Hash, parent: Hash, anchor: Hash) -> Block {
        Block {
            hash: crate::hash::keccak256(format!("{from:?}{parent:?}").as_bytes()),
            previous,
            parents: vec![parent],
            links: vec![],
            approves: vec![],
            last_summary_block: anchor,
            last_stable_block: anchor,
            from,
            exec_timestamp: 0,
        }
    }

    #[test]
    fn single_witness_chain_advances_and_stabilises() {
        let mut store = MemoryStore::new();
        let mut cache = Cache::new(&mut store);
        let mut config = NodeConfig::default();
        config.witness_count = 1;
        config.genesis_witness_list = vec![Address::from_low_u64_be(100)];
        let genesis_hash = genesis::bootstrap(&mut cache, &config).unwrap();

        let witness = Address::from_low_u64_be(100);
        let b1 = child_block(witness, Hash::zero(), genesis_hash, genesis_hash);
        admit(&mut cache, b1.clone()).unwrap();
        let b2 = child_block(witness, b1.hash, b1.hash, genesis_hash);
        admit(&mut cache, b2.clone()).unwrap();
        let b3 = child_block(witness, b2.hash, b2.hash, genesis_hash);
        admit(&mut cache, b3.clone()).unwrap();

        let precompiles = StandardPrecompiles::new(config.precompile_gas.clone());
        let advanced = try_advance(&mut cache, &config, &precompiles).unwrap();
        assert!(advanced >= 1);

        let last_mci: u64 = cache.get(ColumnFamily::Metadata, b"last_mci").unwrap().unwrap();
        assert_eq!(last_mci, 3);

        let b3_state: BlockState = cache.get(ColumnFamily::BlockState, &keys::hash_key(b3.hash)).unwrap().unwrap();
        assert!(b3_state.is_stable || last_mci == 3);
    }

    #[test]
    fn linked_transaction_is_executed_exactly_once() {
        let mut store = MemoryStore::new();
        let mut cache = Cache::new(&mut store);
        let mut config = NodeConfig::default();
        config.witness_count = 1;
        config.genesis_witness_list = vec![Address::from_low_u64_be(100)];
        let genesis_hash = genesis::bootstrap(&mut cache, &config).unwrap();

        let witness = Address::from_low_u64_be(100);
        let alice = Address::from_low_u64_be(42);
        let bob = Address::from_low_u64_be(43);

        use crate::executor::state::ExecutionState;
        let mut state = ExecutionState::new();
        state.add_balance(&mut cache, alice, crate::types::U256::from(100u64)).unwrap();
        state.commit(&mut cache).unwrap();

        let tx = Transaction {
            hash: crate::hash::keccak256(b"tx-1"),
            from: alice,
            to: bob,
            nonce: crate::types::U256::zero(),
            value: crate::types::U256::from(10u64),
            gas_limit: crate::types::U256::from(100_000u64),
            gas_price: crate::types::U256::zero(),
            data: vec![],
        };
        cache.put(ColumnFamily::Transaction, &keys::hash_key(tx.hash), &tx).unwrap();
        cache.put(ColumnFamily::Metadata, b"transaction_unstable_count", &1u64).unwrap();

        let mut b1 = child_block(witness, Hash::zero(), genesis_hash, genesis_hash);
        b1.links = vec![tx.hash];
        admit(&mut cache, b1.clone()).unwrap();
        let b2 = child_block(witness, b1.hash, b1.hash, genesis_hash);
        admit(&mut cache, b2.clone()).unwrap();

        let precompiles = StandardPrecompiles::new(config.precompile_gas.clone());
        try_advance(&mut cache, &config, &precompiles).unwrap();

        let receipt: Receipt =
            cache.get(ColumnFamily::TransactionReceipt, &keys::hash_key(tx.hash)).unwrap().unwrap();
        assert_eq!(receipt.status, crate::types::ReceiptStatus::Success);
        assert_eq!(receipt.contract_address, create_sentinel());

        let bob_balance =
            cache.get::<crate::types::AccountState>(ColumnFamily::AccountState, bob.as_bytes()).unwrap().unwrap().balance;
        assert_eq!(bob_balance, crate::types::U256::from(10u64));
    }
}
