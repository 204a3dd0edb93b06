//! The DAG writer (`§4.3`): admits a validated block, links it to its
//! parents, and computes the fields (`level`, `witnessed_level`,
//! `best_parent`) the main-chain selector needs.

use std::collections::HashSet;

use crate::cache::Cache;
use crate::error::{CResult, ChainError};
use crate::store::{keys, ColumnFamily, Store};
use crate::types::{address_root, Address, Block, BlockState, Hash};
use crate::witness::{self, WitnessParam};

/// Among `parents`, the one with the greatest `witnessed_level`, breaking
/// ties by greatest `level`, then by least hash (`§4.3` step 5's operative
/// text). This is *not* the same ordering the free-tips index uses (`§4.3`
/// step 8 breaks a `witnessed_level` tie by least `level` instead) despite
/// the glossary's one-line gloss suggesting otherwise -- the per-step
/// algorithm text governs here.
pub fn determine_best_parent<S: Store>(cache: &mut Cache<S>, parents: &[Hash]) -> CResult<Hash> {
    let mut best: Option<(u64, u64, Hash)> = None;
    for &p in parents {
        let state: BlockState = cache
            .get(ColumnFamily::BlockState, &keys::hash_key(p))?
            .ok_or(ChainError::MissingState(p))?;
        let candidate = (state.witnessed_level, state.level, p);
        best = Some(match best {
            None => candidate,
            Some(cur) => pick_best(cur, candidate),
        });
    }
    best.map(|(_, _, hash)| hash).ok_or_else(|| ChainError::Invariant("block has no parents".into()))
}

/// `(witnessed_level desc, level desc, hash asc)`: the best-parent
/// tie-break order, distinct from the free-tip order below (which breaks
/// a `witnessed_level` tie by *ascending* level instead).
fn pick_best(a: (u64, u64, Hash), b: (u64, u64, Hash)) -> (u64, u64, Hash) {
    if b.0 != a.0 {
        if b.0 > a.0 {
            b
        } else {
            a
        }
    } else if b.1 != a.1 {
        if b.1 > a.1 {
            b
        } else {
            a
        }
    } else if b.2 < a.2 {
        b
    } else {
        a
    }
}

/// Walks `best_parent` pointers from `start` downward, collecting distinct
/// witness addresses until a majority of the epoch's witness list has been
/// seen. Returns the level at which majority was reached, or 0 if the walk
/// reaches genesis without ever reaching it.
pub fn calc_witnessed_level<S: Store>(
    cache: &mut Cache<S>,
    witness_param: &WitnessParam,
    start: Hash,
) -> CResult<u64> {
    let mut seen: HashSet<Address> = HashSet::new();
    let mut cursor = start;
    loop {
        let block: Block = cache
            .get(ColumnFamily::Block, &keys::hash_key(cursor))?
            .ok_or(ChainError::MissingBlock(cursor))?;
        let state: BlockState = cache
            .get(ColumnFamily::BlockState, &keys::hash_key(cursor))?
            .ok_or(ChainError::MissingState(cursor))?;

        if witness_param.is_witness(&block.from) {
            seen.insert(block.from);
            if seen.len() >= witness_param.majority {
                return Ok(state.level);
            }
        }

        match state.best_parent {
            Some(parent) => cursor = parent,
            None => return Ok(0), // reached genesis without a majority
        }
    }
}

/// Admits `block` into the DAG: persists it, unfrees its parents, links
/// children, and computes level/witnessed-level/best-parent before placing
/// it into the free-tips index. Caller must have already validated the
/// block's signature and format, and that every parent is already
/// admitted.
pub fn write_dag_block<S: Store>(cache: &mut Cache<S>, block: Block) -> CResult<()> {
    let hash = block.hash;

    cache.put(ColumnFamily::Block, &keys::hash_key(hash), &block)?;

    let root_key = keys::hash_key(address_root(block.from));
    if cache.get::<Hash>(ColumnFamily::Successor, &root_key)?.is_none() {
        cache.put(ColumnFamily::Successor, &root_key, &hash)?;
    }

    for &parent in &block.parents {
        let mut parent_state: BlockState = cache
            .get(ColumnFamily::BlockState, &keys::hash_key(parent))?
            .ok_or(ChainError::MissingState(parent))?;
        if parent_state.is_free {
            parent_state.is_free = false;
            cache.put(ColumnFamily::BlockState, &keys::hash_key(parent), &parent_state)?;
            cache.delete(
                ColumnFamily::DagFree,
                &keys::free_tip_key(parent_state.witnessed_level, parent_state.level, parent),
            );
        }

        let mut children: Vec<Hash> =
            cache.get(ColumnFamily::BlockChild, &keys::hash_key(parent))?.unwrap_or_default();
        children.push(hash);
        cache.put(ColumnFamily::BlockChild, &keys::hash_key(parent), &children)?;
    }

    let summary_anchor: BlockState = cache
        .get(ColumnFamily::BlockState, &keys::hash_key(block.last_summary_block))?
        .ok_or(ChainError::MissingState(block.last_summary_block))?;
    if !summary_anchor.is_stable || !summary_anchor.is_on_main_chain {
        return Err(ChainError::InvalidSummaryAnchor(block.last_summary_block));
    }
    let anchor_mci = summary_anchor.main_chain_index.ok_or(ChainError::InvalidSummaryAnchor(block.last_summary_block))?;
    let epoch = witness::epoch_of(anchor_mci, witness_epoch_period(cache)?);
    let witness_param = witness::load_witness_param(cache, epoch)?
        .ok_or_else(|| ChainError::Invariant(format!("missing witness param for epoch {epoch}")))?;

    let best_parent = determine_best_parent(cache, &block.parents)?;

    let mut level = 0u64;
    for &parent in &block.parents {
        let parent_state: BlockState =
            cache.get(ColumnFamily::BlockState, &keys::hash_key(parent))?.ok_or(ChainError::MissingState(parent))?;
        level = level.max(parent_state.level);
    }
    level += 1;

    let witnessed_level = calc_witnessed_level(cache, &witness_param, best_parent)?;

    let state = BlockState::new_free(level, witnessed_level, Some(best_parent));
    cache.put(ColumnFamily::BlockState, &keys::hash_key(hash), &state)?;
    cache.put(ColumnFamily::DagFree, &keys::free_tip_key(witnessed_level, level, hash), &hash)?;

    Ok(())
}

/// The epoch period is read from metadata rather than threaded through
/// every call; it is written once at genesis alongside the genesis
/// witness param.
fn witness_epoch_period<S: Store>(cache: &mut Cache<S>) -> CResult<u64> {
    cache
        .get(ColumnFamily::Metadata, b"epoch_period")?
        .ok_or_else(|| ChainError::Invariant("epoch_period not initialised".into()))
}
