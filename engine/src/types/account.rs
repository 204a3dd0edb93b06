use rlp_derive::{RlpDecodable, RlpEncodable};
use serde_derive::{Deserialize, Serialize};

use super::{Hash, U256};

/// The canonical, persisted form of an account. Storage and code live in
/// separate column families keyed by `storage_root`/`code_hash`; this is
/// what `account_state[address]` holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable)]
pub struct AccountState {
    pub nonce: U256,
    pub balance: U256,
    pub storage_root: Hash,
    pub code_hash: Hash,
}

impl AccountState {
    pub fn empty() -> Self {
        Self {
            nonce: U256::zero(),
            balance: U256::zero(),
            storage_root: Hash::zero(),
            code_hash: Hash::zero(),
        }
    }

    /// EIP-161-style emptiness: no balance, no nonce, no code.
    pub fn is_empty(&self) -> bool {
        self.nonce.is_zero() && self.balance.is_zero() && self.code_hash.is_zero()
    }
}

impl Default for AccountState {
    fn default() -> Self {
        Self::empty()
    }
}
