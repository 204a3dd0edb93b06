//! Byte-key encodings for the column families that are not simply keyed by
//! a 32-byte hash.
//!
//! The free-tips index (`DagFree`) needs a composite key ordered by
//! `(witnessed_level desc, level asc, hash asc)`; since the underlying
//! engine only orders keys lexicographically, the descending component is
//! encoded as its bitwise complement so ascending byte order gives
//! descending witnessed level.

use primitive_types::{H160, H256};

pub fn u64_be(v: u64) -> [u8; 8] {
    v.to_be_bytes()
}

pub fn mci_key(mci: u64) -> Vec<u8> {
    u64_be(mci).to_vec()
}

pub fn hash_key(h: H256) -> Vec<u8> {
    h.as_bytes().to_vec()
}

pub fn child_key(parent: H256, child: H256) -> Vec<u8> {
    let mut k = Vec::with_capacity(64);
    k.extend_from_slice(parent.as_bytes());
    k.extend_from_slice(child.as_bytes());
    k
}

/// Key for the `DagFree` column family: free tips are scanned in ascending
/// key order to obtain `(witnessed_level desc, level asc, hash asc)`.
pub fn free_tip_key(witnessed_level: u64, level: u64, hash: H256) -> Vec<u8> {
    let mut k = Vec::with_capacity(24);
    k.extend_from_slice(&u64_be(!witnessed_level));
    k.extend_from_slice(&u64_be(level));
    k.extend_from_slice(hash.as_bytes());
    k
}

pub fn epoch_key(epoch: u64) -> Vec<u8> {
    u64_be(epoch).to_vec()
}

/// Key for the `VrfOutputs` column family within one epoch: entries are
/// scanned in ascending key order and consumed from the back to recover
/// descending-by-output order (see witness rotation).
pub fn vrf_output_key(epoch: u64, output: H256, sender_tie_break: H256) -> Vec<u8> {
    let mut k = Vec::with_capacity(72);
    k.extend_from_slice(&u64_be(epoch));
    k.extend_from_slice(output.as_bytes());
    k.extend_from_slice(sender_tie_break.as_bytes());
    k
}

pub fn tx_address_key(tx: H256) -> Vec<u8> {
    hash_key(tx)
}

/// Key for one account's storage slot, within the `AccountState` column
/// family: the 20-byte address followed by the 32-byte slot.
pub fn account_storage_key(address: H160, slot: H256) -> Vec<u8> {
    let mut k = Vec::with_capacity(52);
    k.extend_from_slice(address.as_bytes());
    k.extend_from_slice(slot.as_bytes());
    k
}
