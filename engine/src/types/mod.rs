//! Wire and storage types shared across the chain engine: blocks, their
//! mutable per-block state, transactions, approvals, account state and
//! receipts.

mod account;
mod approval;
mod block;
mod receipt;
mod transaction;

pub use account::AccountState;
pub use approval::{Approval, ApprovalReceipt};
pub use block::{Block, BlockState, BlockStatus};
pub use receipt::{Receipt, ReceiptStatus};
pub use transaction::Transaction;

pub use primitive_types::{H160, H256, U256};

/// A 32-byte hash, used for blocks, transactions, approvals and summaries.
pub type Hash = H256;

/// A 20-byte account address.
pub type Address = H160;

/// Zero address, used as the `to` sentinel for contract-creation
/// transactions since rlp-derive does not round-trip `Option<T>`.
pub fn create_sentinel() -> Address {
    Address::zero()
}

/// The fork-detection "root" key for a sender's chain of blocks (`§4.3`,
/// `§4.8`): every block from the same `from` address shares one
/// `successor` entry, so two blocks that both claim the same predecessor
/// are detected as a fork regardless of which one is processed first. An
/// address, not a block hash, is used as the root -- keying off
/// `previous` instead would collide every sender's first-ever block (all
/// of which use the zero hash as `previous`) onto the same root.
pub fn address_root(address: Address) -> Hash {
    let mut padded = [0u8; 32];
    padded[12..].copy_from_slice(address.as_bytes());
    Hash::from(padded)
}
