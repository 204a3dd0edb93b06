//! The public façade: wires the DAG writer, main-chain selector and
//! latest-included-MCI fixpoint into the one control path block admission
//! follows (`§2`: "accepted block → C → D → E"), and exposes submission of
//! loose transactions/approvals plus the stability advancer.

use crate::cache::Cache;
use crate::config::NodeConfig;
use crate::error::CResult;
use crate::executor::precompiles::Precompiles;
use crate::genesis;
use crate::limci;
use crate::main_chain;
use crate::store::{keys, ColumnFamily, Store};
use crate::types::{Approval, Block, Hash, Transaction};
use crate::{advance, dag};

/// Bootstraps an empty store. Call exactly once before any other
/// operation in this module.
pub fn init<S: Store>(cache: &mut Cache<S>, config: &NodeConfig) -> CResult<Hash> {
    genesis::bootstrap(cache, config)
}

/// Admits one validated block: persists it through the DAG writer, runs
/// the main-chain selector on the resulting free-tips set, and refreshes
/// included-MCI bounds for the affected subtree. Caller must have already
/// validated the block's signature/format and admitted every parent.
pub fn ingest_block<S: Store>(cache: &mut Cache<S>, block: Block) -> CResult<()> {
    let hash = block.hash;
    dag::write_dag_block(cache, block)?;

    let last_mci: u64 = cache.get(ColumnFamily::Metadata, b"last_mci")?.unwrap_or(0);
    let last_stable_mci: u64 = cache.get(ColumnFamily::Metadata, b"last_stable_mci")?.unwrap_or(0);

    if let Some(change) = main_chain::find_main_chain_changes(cache, last_mci, last_stable_mci)? {
        limci::update_latest_included_mci(cache, &change, hash)?;
        cache.put(ColumnFamily::Metadata, b"last_mci", &change.new_last_mci)?;
        cache.put(ColumnFamily::Metadata, b"advance_info", &(change.new_last_mci, hash))?;
    }

    // One block is one logical write transaction (`§4.3`): the timeout
    // transaction checkpoints here rather than leaving it open for the
    // next block to share.
    cache.checkpoint()?;

    Ok(())
}

/// Submits a loose transaction to be linked by some future block. Mirrors
/// the `transaction[hash32] → rlp` column family of `§6`; mempool
/// admission policy itself is out of scope (`§1`).
pub fn submit_transaction<S: Store>(cache: &mut Cache<S>, tx: &Transaction) -> CResult<()> {
    cache.put(ColumnFamily::Transaction, &keys::hash_key(tx.hash), tx)?;
    bump_counter(cache, b"transaction_count")?;
    bump_counter(cache, b"transaction_unstable_count")?;
    Ok(())
}

/// Submits a loose approval to be linked by some future block.
pub fn submit_approval<S: Store>(cache: &mut Cache<S>, approval: &Approval) -> CResult<()> {
    cache.put(ColumnFamily::Approve, &keys::hash_key(approval.hash), approval)?;
    bump_counter(cache, b"approve_count")?;
    bump_counter(cache, b"approve_unstable_count")?;
    Ok(())
}

/// Runs the stability advancer to completion against the current
/// `advance_info`, executing newly-stable transactions/approvals and
/// rotating witnesses at epoch boundaries. Returns the number of MCIs
/// stabilised.
pub fn try_advance<S: Store, P: Precompiles>(
    cache: &mut Cache<S>,
    config: &NodeConfig,
    precompiles: &P,
) -> CResult<u64> {
    advance::try_advance(cache, config, precompiles)
}

fn bump_counter<S: Store>(cache: &mut Cache<S>, key: &[u8]) -> CResult<()> {
    let current: u64 = cache.get(ColumnFamily::Metadata, key)?.unwrap_or(0);
    cache.put(ColumnFamily::Metadata, key, &(current + 1))
}
