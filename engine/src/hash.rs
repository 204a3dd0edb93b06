//! Keccak-256, used for summary hashes, contract addresses and code hashes.

use sha3::{Digest, Keccak256};

use crate::types::Hash;

pub fn keccak256(data: &[u8]) -> Hash {
    let digest = Keccak256::digest(data);
    Hash::from_slice(&digest)
}
