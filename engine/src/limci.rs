//! The latest-included-MCI fixpoint (`§4.5`): after the main-chain selector
//! runs, refreshes the `{earliest,latest,bp,earliest_bp,latest_bp}_included_mc_index`
//! bounds for every block whose parents' main-chain membership may have
//! changed.

use std::collections::{HashSet, VecDeque};

use crate::cache::Cache;
use crate::error::{CResult, ChainError};
use crate::main_chain::MainChainChange;
use crate::store::{keys, ColumnFamily, Store};
use crate::types::{Block, BlockState, Hash};

/// Recomputes included-MCI bounds for the subtree affected by `change`.
pub fn update_latest_included_mci<S: Store>(
    cache: &mut Cache<S>,
    change: &MainChainChange,
    new_block: Hash,
) -> CResult<()> {
    let scope: Vec<Hash> = if change.is_retreat {
        let anchor: Hash = cache
            .get(ColumnFamily::MainChain, &keys::mci_key(change.retreat_mci))?
            .ok_or_else(|| ChainError::Invariant(format!("no block at mci {}", change.retreat_mci)))?;
        collect_unstable_descendants(cache, anchor)?
    } else {
        vec![new_block]
    };

    let mut leveled: Vec<(u64, Hash)> = Vec::with_capacity(scope.len());
    for h in scope {
        let state: BlockState =
            cache.get(ColumnFamily::BlockState, &keys::hash_key(h))?.ok_or(ChainError::MissingState(h))?;
        leveled.push((state.level, h));
    }
    leveled.sort_by_key(|(level, _)| *level);

    for (_, u) in leveled {
        let mut state: BlockState =
            cache.get(ColumnFamily::BlockState, &keys::hash_key(u))?.ok_or(ChainError::MissingState(u))?;
        if state.main_chain_index.is_some_and(|m| m <= change.retreat_mci) {
            continue;
        }

        let block: Block =
            cache.get(ColumnFamily::Block, &keys::hash_key(u))?.ok_or(ChainError::MissingBlock(u))?;

        let mut earliest = u64::MAX;
        let mut latest = 0u64;
        let mut bp_limci: Option<u64> = None;
        let mut earliest_bp = u64::MAX;
        let mut latest_bp = 0u64;

        for &p in &block.parents {
            let pstate: BlockState =
                cache.get(ColumnFamily::BlockState, &keys::hash_key(p))?.ok_or(ChainError::MissingState(p))?;

            let (pmin, pmax) = if pstate.is_on_main_chain {
                let m = pstate
                    .main_chain_index
                    .ok_or_else(|| ChainError::Invariant(format!("{p:#x} is on-main without an mci")))?;
                (m, m)
            } else {
                (
                    pstate.earliest_included_mc_index.ok_or(ChainError::MissingState(p))?,
                    pstate.latest_included_mc_index.ok_or(ChainError::MissingState(p))?,
                )
            };
            earliest = earliest.min(pmin);
            latest = latest.max(pmax);

            if state.best_parent == Some(p) {
                let bp_val = if pstate.is_on_main_chain {
                    pstate.main_chain_index.unwrap()
                } else {
                    pstate.bp_included_mc_index.ok_or(ChainError::MissingState(p))?
                };
                bp_limci = Some(bp_val);
            } else if !pstate.is_on_main_chain {
                earliest_bp = earliest_bp.min(pstate.earliest_bp_included_mc_index.ok_or(ChainError::MissingState(p))?);
                latest_bp = latest_bp.max(pstate.latest_bp_included_mc_index.ok_or(ChainError::MissingState(p))?);
            }
        }

        let bp_limci = bp_limci
            .ok_or_else(|| ChainError::Invariant(format!("{u:#x}'s best_parent was not among its parents")))?;
        earliest_bp = earliest_bp.min(bp_limci);
        latest_bp = latest_bp.max(bp_limci);

        state.earliest_included_mc_index = Some(earliest);
        state.latest_included_mc_index = Some(latest);
        state.bp_included_mc_index = Some(bp_limci);
        state.earliest_bp_included_mc_index = Some(earliest_bp);
        state.latest_bp_included_mc_index = Some(latest_bp);
        cache.put(ColumnFamily::BlockState, &keys::hash_key(u), &state)?;
    }

    Ok(())
}

/// BFS over `BlockChild` starting at `anchor`'s children, visiting every
/// reachable block (stable blocks are traversed through, but not
/// returned -- their bounds are frozen by invariant 2).
fn collect_unstable_descendants<S: Store>(cache: &mut Cache<S>, anchor: Hash) -> CResult<Vec<Hash>> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut queue: VecDeque<Hash> = VecDeque::new();
    queue.extend(cache.get::<Vec<Hash>>(ColumnFamily::BlockChild, &keys::hash_key(anchor))?.unwrap_or_default());

    while let Some(h) = queue.pop_front() {
        if !seen.insert(h) {
            continue;
        }
        let state: BlockState =
            cache.get(ColumnFamily::BlockState, &keys::hash_key(h))?.ok_or(ChainError::MissingState(h))?;
        if !state.is_stable {
            out.push(h);
        }
        queue.extend(cache.get::<Vec<Hash>>(ColumnFamily::BlockChild, &keys::hash_key(h))?.unwrap_or_default());
    }

    Ok(out)
}
