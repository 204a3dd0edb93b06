use rlp_derive::{RlpDecodable, RlpEncodable};
use serde_derive::{Deserialize, Serialize};

use super::{Address, Hash};

/// An approval message: a witness's vote carrying a VRF output used to rank
/// candidates for the next epoch's witness list (see `witness`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable)]
pub struct Approval {
    pub hash: Hash,
    pub from: Address,
    pub epoch: u64,
    /// ed25519 signature over `(epoch, seed)`, verified against `from`'s key
    /// and collapsed into `vrf_output` once admitted.
    pub signature: Vec<u8>,
}

/// Persisted once an approval's VRF output has been computed (or recomputed
/// after a restart, from the epoch seed).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable)]
pub struct ApprovalReceipt {
    pub from: Address,
    pub output: Hash,
}
