use rlp_derive::{RlpDecodable, RlpEncodable};
use serde_derive::{Deserialize, Serialize};

use super::{create_sentinel, Address, Hash, U256};

/// A transaction executed against account state once its enclosing block
/// becomes stable. `to == create_sentinel()` (the zero address) signals
/// contract creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable)]
pub struct Transaction {
    pub hash: Hash,
    pub from: Address,
    pub to: Address,
    pub nonce: U256,
    pub value: U256,
    pub gas_limit: U256,
    pub gas_price: U256,
    pub data: Vec<u8>,
}

impl Transaction {
    pub fn is_create(&self) -> bool {
        self.to == create_sentinel()
    }
}
