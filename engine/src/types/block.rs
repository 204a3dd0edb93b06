use rlp_derive::{RlpDecodable, RlpEncodable};
use serde_derive::{Deserialize, Serialize};

use super::{Address, Hash};

/// An admitted DAG block. Immutable once persisted by the DAG writer.
///
/// `hash` is carried on the struct rather than derived, since block
/// admission in this engine assumes signature/format validation already
/// happened upstream (see the scope note on block validation).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable)]
pub struct Block {
    pub hash: Hash,
    /// Same-sender predecessor, or the zero hash for a sender's first block.
    pub previous: Hash,
    /// DAG parents, at least one (the genesis block is the sole exception).
    pub parents: Vec<Hash>,
    /// Transactions this block links, in execution order.
    pub links: Vec<Hash>,
    /// Approval messages this block references, in order.
    pub approves: Vec<Hash>,
    /// A stable, on-main ancestor whose epoch defines the witness
    /// parameters used to compute this block's witnessed level.
    pub last_summary_block: Hash,
    /// A stable ancestor defining this block's retrievability frontier.
    pub last_stable_block: Hash,
    pub from: Address,
    pub exec_timestamp: u64,
}

/// A block's fork status, frozen once the block becomes stable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockStatus {
    Unknown,
    Ok,
    Fork,
}

/// Mutable per-block record maintained by the DAG writer, main-chain
/// selector, latest-included-MCI fixpoint and stability advancer.
///
/// Every MCI-shaped field is `Option` rather than a sentinel value -- the
/// source this was ported from used `boost::optional` for exactly this
/// reason, and a sentinel invites off-by-one bugs at genesis (whose real
/// MCI is 0).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockState {
    pub status: BlockStatus,
    pub is_free: bool,
    pub is_on_main_chain: bool,
    pub main_chain_index: Option<u64>,

    pub is_stable: bool,
    pub stable_index: Option<u64>,
    pub stable_timestamp: Option<u64>,
    pub mc_timestamp: Option<u64>,

    pub level: u64,
    pub witnessed_level: u64,
    pub best_parent: Option<Hash>,

    pub earliest_included_mc_index: Option<u64>,
    pub latest_included_mc_index: Option<u64>,
    pub bp_included_mc_index: Option<u64>,
    pub earliest_bp_included_mc_index: Option<u64>,
    pub latest_bp_included_mc_index: Option<u64>,
}

impl BlockState {
    /// The state of a freshly admitted, not-yet-ordered DAG block.
    pub fn new_free(level: u64, witnessed_level: u64, best_parent: Option<Hash>) -> Self {
        Self {
            status: BlockStatus::Unknown,
            is_free: true,
            is_on_main_chain: false,
            main_chain_index: None,
            is_stable: false,
            stable_index: None,
            stable_timestamp: None,
            mc_timestamp: None,
            level,
            witnessed_level,
            best_parent,
            earliest_included_mc_index: None,
            latest_included_mc_index: None,
            bp_included_mc_index: None,
            earliest_bp_included_mc_index: None,
            latest_bp_included_mc_index: None,
        }
    }

    /// The state of the genesis block: stable and on-main from birth.
    pub fn genesis() -> Self {
        Self {
            status: BlockStatus::Ok,
            is_free: true,
            is_on_main_chain: true,
            main_chain_index: Some(0),
            is_stable: true,
            stable_index: Some(0),
            stable_timestamp: Some(0),
            mc_timestamp: Some(0),
            level: 0,
            witnessed_level: 0,
            best_parent: None,
            earliest_included_mc_index: Some(0),
            latest_included_mc_index: Some(0),
            bp_included_mc_index: Some(0),
            earliest_bp_included_mc_index: Some(0),
            latest_bp_included_mc_index: Some(0),
        }
    }
}
