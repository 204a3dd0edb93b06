use rlp::{Encodable, RlpStream};
use rlp_derive::{RlpDecodable, RlpEncodable};
use serde_derive::{Deserialize, Serialize};

use super::{Address, Hash, U256};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Success,
    /// Failed with no state change other than the sender's nonce
    /// consumption (insufficient balance) or a VM exception that rolled
    /// back to the pre-transaction savepoint.
    Failed,
}

impl Encodable for ReceiptStatus {
    fn rlp_append(&self, s: &mut RlpStream) {
        let byte: u8 = match self {
            ReceiptStatus::Success => 1,
            ReceiptStatus::Failed => 0,
        };
        s.append(&byte);
    }
}

impl rlp::Decodable for ReceiptStatus {
    fn decode(rlp: &rlp::Rlp) -> Result<Self, rlp::DecoderError> {
        let byte: u8 = rlp.as_val()?;
        Ok(if byte == 1 { ReceiptStatus::Success } else { ReceiptStatus::Failed })
    }
}

/// Emitted for every executed transaction, in the order txs were linked,
/// and folded into the receipts root of the stabilising block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, RlpEncodable, RlpDecodable)]
pub struct Receipt {
    pub tx_hash: Hash,
    pub status: ReceiptStatus,
    pub gas_used: U256,
    /// Set for successful contract-creation transactions.
    pub contract_address: Address,
}
