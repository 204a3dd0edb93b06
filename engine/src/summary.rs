//! The summariser (`§4.8`): finalises one DAG block's transition to stable,
//! detecting forks, assigning its `stable_index`, and computing the
//! recursive summary hash that binds it to its ancestry, receipts and
//! skip-list.

use crate::cache::Cache;
use crate::error::{CResult, ChainError};
use crate::hash::keccak256;
use crate::store::{keys, ColumnFamily, Store};
use crate::types::{address_root, Block, BlockState, BlockStatus, Hash};

/// Everything `set_block_stable` needs about the batch this block belongs
/// to, computed once per MCI by the stability advancer.
pub struct StableContext {
    pub mci: u64,
    pub mc_timestamp: u64,
    pub skiplist_mcis: Vec<u64>,
}

/// Finalises block `hash` as stable: detects forks against its same-sender
/// predecessor and successor pointer, assigns `main_chain_index`,
/// `stable_index`, timestamps, and computes + persists the summary hash.
/// Asserts the block was not already stable (`§9`: kept as a hard
/// invariant, not silently tolerated).
pub fn set_block_stable<S: Store>(
    cache: &mut Cache<S>,
    ctx: &StableContext,
    hash: Hash,
    receipts_root: Hash,
    stable_index: u64,
) -> CResult<()> {
    let block: Block = cache.get(ColumnFamily::Block, &keys::hash_key(hash))?.ok_or(ChainError::MissingBlock(hash))?;
    let mut state: BlockState =
        cache.get(ColumnFamily::BlockState, &keys::hash_key(hash))?.ok_or(ChainError::MissingState(hash))?;

    debug_assert!(!state.is_stable, "set_block_stable called twice for {hash:#x}");
    if state.is_stable {
        return Err(ChainError::AlreadyStable(hash));
    }

    let status = detect_fork_status(cache, &block, hash)?;

    if status == BlockStatus::Ok {
        cache.put(ColumnFamily::DagAccount, block.from.as_bytes(), &hash)?;
    }

    state.status = status;
    state.main_chain_index = Some(ctx.mci);
    state.mc_timestamp = Some(ctx.mc_timestamp);
    state.stable_timestamp = Some(now_unix());
    state.is_stable = true;
    state.stable_index = Some(stable_index);
    cache.put(ColumnFamily::BlockState, &keys::hash_key(hash), &state)?;
    cache.put(ColumnFamily::StableIndex, &keys::u64_be(stable_index), &hash)?;

    let previous_summary = summary_of(cache, block.previous)?;
    let mut parent_summaries = Vec::with_capacity(block.parents.len());
    for &parent in &block.parents {
        parent_summaries.push(summary_of(cache, parent)?);
    }

    let mut skiplist_hashes = Vec::with_capacity(ctx.skiplist_mcis.len());
    for &mci in &ctx.skiplist_mcis {
        if let Some(anchor) = cache.get::<Hash>(ColumnFamily::MainChain, &keys::mci_key(mci))? {
            skiplist_hashes.push(summary_of(cache, anchor)?);
        }
    }
    skiplist_hashes.sort();

    if !skiplist_hashes.is_empty() {
        cache.put(ColumnFamily::Skiplist, &keys::hash_key(hash), &skiplist_hashes)?;
    }

    let summary_hash = compute_summary_hash(
        hash,
        previous_summary,
        &parent_summaries,
        receipts_root,
        &skiplist_hashes,
        status,
        stable_index,
        ctx.mc_timestamp,
    );

    cache.put(ColumnFamily::Summary, &keys::hash_key(hash), &summary_hash)?;
    cache.put(ColumnFamily::SummaryBlock, &keys::hash_key(summary_hash), &hash)?;

    Ok(())
}

fn detect_fork_status<S: Store>(cache: &mut Cache<S>, block: &Block, hash: Hash) -> CResult<BlockStatus> {
    if !block.previous.is_zero() {
        let prev_state: BlockState = cache
            .get(ColumnFamily::BlockState, &keys::hash_key(block.previous))?
            .ok_or(ChainError::MissingState(block.previous))?;
        if prev_state.status == BlockStatus::Fork {
            return Ok(BlockStatus::Fork);
        }
    }

    let successor_key = keys::hash_key(address_root(block.from));
    let succ: Option<Hash> = cache.get(ColumnFamily::Successor, &successor_key)?;
    match succ {
        Some(succ) if succ != hash => {
            let succ_state: BlockState =
                cache.get(ColumnFamily::BlockState, &keys::hash_key(succ))?.ok_or(ChainError::MissingState(succ))?;
            if succ_state.is_stable {
                Ok(BlockStatus::Fork)
            } else {
                cache.put(ColumnFamily::Successor, &successor_key, &hash)?;
                Ok(BlockStatus::Ok)
            }
        }
        _ => Ok(BlockStatus::Ok),
    }
}

fn summary_of<S: Store>(cache: &mut Cache<S>, hash: Hash) -> CResult<Hash> {
    if hash.is_zero() {
        return Ok(Hash::zero());
    }
    cache.get(ColumnFamily::Summary, &keys::hash_key(hash))?.ok_or(ChainError::MissingState(hash))
}

fn status_byte(status: BlockStatus) -> u8 {
    match status {
        BlockStatus::Ok => 0,
        BlockStatus::Fork => 1,
        BlockStatus::Unknown => 2,
    }
}

/// `§6`'s bit-exact pre-image: `block_hash ‖ previous_summary ‖
/// concat(parent_summaries) ‖ receipts_root ‖ concat(skiplist_summaries)
/// ‖ status_byte ‖ stable_index_be ‖ mc_timestamp_be`, Keccak-256'd.
#[allow(clippy::too_many_arguments)]
fn compute_summary_hash(
    block_hash: Hash,
    previous_summary: Hash,
    parent_summaries: &[Hash],
    receipts_root: Hash,
    skiplist_summaries: &[Hash],
    status: BlockStatus,
    stable_index: u64,
    mc_timestamp: u64,
) -> Hash {
    let mut buf = Vec::with_capacity(
        32 + 32 + 32 * parent_summaries.len() + 32 + 32 * skiplist_summaries.len() + 1 + 8 + 8,
    );
    buf.extend_from_slice(block_hash.as_bytes());
    buf.extend_from_slice(previous_summary.as_bytes());
    for s in parent_summaries {
        buf.extend_from_slice(s.as_bytes());
    }
    buf.extend_from_slice(receipts_root.as_bytes());
    for s in skiplist_summaries {
        buf.extend_from_slice(s.as_bytes());
    }
    buf.push(status_byte(status));
    buf.extend_from_slice(&stable_index.to_be_bytes());
    buf.extend_from_slice(&mc_timestamp.to_be_bytes());
    keccak256(&buf)
}

/// Builds the skip-list MCIs for `mci`: `mci - d, mci - d², …` for as long
/// as `mci % d^k == 0` (`§4.8` step 4).
pub fn skip_list_mcis(mci: u64, divisor: u64) -> Vec<u64> {
    let mut out = Vec::new();
    if divisor < 2 {
        return out;
    }
    let mut d = divisor;
    while mci % d == 0 {
        match mci.checked_sub(d) {
            Some(m) => out.push(m),
            None => break,
        }
        match d.checked_mul(divisor) {
            Some(next) => d = next,
            None => break,
        }
    }
    out
}

fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
