//! The main-chain selector (`§4.4`): picks the best free tip, walks it
//! back to the nearest on-main ancestor, and reassigns main chain indices
//! along the new best-parent path. May retreat (undo) previously assigned
//! MCIs strictly above the stable frontier.

use crate::cache::Cache;
use crate::error::{CResult, ChainError};
use crate::store::{keys, ColumnFamily, Store};
use crate::types::{BlockState, Hash};

/// The outcome of one main-chain update: which MCIs were touched, and
/// whether this was a retreat (the previous best tip's chain was
/// displaced).
pub struct MainChainChange {
    pub retreat_mci: u64,
    pub new_last_mci: u64,
    pub is_retreat: bool,
    /// Hashes of blocks promoted onto the main chain by this update, in
    /// ascending MCI order. Consumed by the latest-included-MCI fixpoint.
    pub promoted: Vec<Hash>,
}

/// The first entry of the `DagFree` index: the tip with greatest
/// `witnessed_level`, tie-broken by least `level`, then least hash.
pub fn best_free_tip<S: Store>(cache: &mut Cache<S>) -> CResult<Option<Hash>> {
    let tips: Vec<(Vec<u8>, Hash)> = cache.scan_prefix(ColumnFamily::DagFree, &[])?;
    Ok(tips.into_iter().next().map(|(_, hash)| hash))
}

/// Recomputes the main chain from the current best free tip and applies
/// demote/promote to the store. `last_mci`/`last_stable_mci` are the
/// engine's cached frontiers before this call.
pub fn find_main_chain_changes<S: Store>(
    cache: &mut Cache<S>,
    last_mci: u64,
    last_stable_mci: u64,
) -> CResult<Option<MainChainChange>> {
    let Some(tip) = best_free_tip(cache)? else {
        return Ok(None);
    };

    // Walk best_parent pointers from the tip until we hit a block that is
    // already on the main chain.
    let mut stack = Vec::new();
    let mut cursor = tip;
    let anchor_mci;
    loop {
        let state: BlockState =
            cache.get(ColumnFamily::BlockState, &keys::hash_key(cursor))?.ok_or(ChainError::MissingState(cursor))?;
        if state.is_on_main_chain {
            anchor_mci = state.main_chain_index.ok_or_else(|| {
                ChainError::Invariant(format!("{cursor:#x} is on-main but has no main_chain_index"))
            })?;
            break;
        }
        stack.push(cursor);
        cursor = state
            .best_parent
            .ok_or_else(|| ChainError::Invariant(format!("{cursor:#x} has no best_parent and is not on-main")))?;
    }

    let is_retreat = anchor_mci < last_mci;

    if anchor_mci < last_stable_mci {
        return Err(ChainError::StableRetreat { stable: last_stable_mci, attempted: anchor_mci });
    }

    // Demote everything above the anchor down to last_mci.
    for mci in (anchor_mci + 1..=last_mci).rev() {
        let key = keys::mci_key(mci);
        if let Some(hash) = cache.get::<Hash>(ColumnFamily::MainChain, &key)? {
            let mut state: BlockState =
                cache.get(ColumnFamily::BlockState, &keys::hash_key(hash))?.ok_or(ChainError::MissingState(hash))?;
            state.is_on_main_chain = false;
            state.main_chain_index = None;
            cache.put(ColumnFamily::BlockState, &keys::hash_key(hash), &state)?;
            cache.delete(ColumnFamily::MainChain, &key);
        }
    }

    // Promote the stack (popped from the anchor's child toward the tip),
    // assigning consecutive MCIs.
    let mut promoted = Vec::with_capacity(stack.len());
    let mut mci = anchor_mci;
    while let Some(hash) = stack.pop() {
        mci += 1;
        let mut state: BlockState =
            cache.get(ColumnFamily::BlockState, &keys::hash_key(hash))?.ok_or(ChainError::MissingState(hash))?;
        state.is_on_main_chain = true;
        state.main_chain_index = Some(mci);
        cache.put(ColumnFamily::BlockState, &keys::hash_key(hash), &state)?;
        cache.put(ColumnFamily::MainChain, &keys::mci_key(mci), &hash)?;
        promoted.push(hash);
    }

    Ok(Some(MainChainChange { retreat_mci: anchor_mci, new_last_mci: mci, is_retreat, promoted }))
}
