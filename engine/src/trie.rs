//! The receipts-root computation (`§6`): an index-keyed ordered
//! Merkle-Patricia trie over RLP-encoded receipts, computed with the same
//! `triehash` crate the Ethereum-client lineage this engine borrows its
//! account-state model from uses for transaction and receipt roots.
//!
//! `triehash::ordered_trie_root` is generic over `hash_db::Hasher`; the
//! ecosystem's own `keccak-hasher` crate binds that trait to
//! `ethereum_types::H256`, a different (if structurally identical) type
//! from the `primitive_types::H256` this crate uses as `Hash`, so this
//! module supplies the same binding against our own `Hash` type instead.

use hash_db::Hasher;

use crate::hash::keccak256;
use crate::types::Hash;

/// `hash_db::Hasher::StdHasher` backs the in-memory maps a trie
/// implementation keys by `Out`. Keccak output is already uniformly
/// distributed, so folding its leading bytes into a `u64` is all a
/// conforming `std::hash::Hasher` needs to do here.
#[derive(Default)]
pub struct FoldedHasher(u64);

impl std::hash::Hasher for FoldedHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut buf = [0u8; 8];
        let n = bytes.len().min(8);
        buf[..n].copy_from_slice(&bytes[..n]);
        self.0 = u64::from_ne_bytes(buf);
    }
}

/// Binds `hash_db::Hasher` to Keccak-256 over this crate's `Hash` type.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainKeccakHasher;

impl Hasher for ChainKeccakHasher {
    type Out = Hash;
    type StdHasher = FoldedHasher;
    const LENGTH: usize = 32;

    fn hash(x: &[u8]) -> Self::Out {
        keccak256(x)
    }
}

/// `ordered_trie_root(RLP(receipt_i))` from `§6`: the receipts root is the
/// root of an index-keyed trie over the RLP encodings, in the order they
/// were emitted (links then approves, per the stability advancer).
pub fn ordered_trie_root(rlp_items: Vec<Vec<u8>>) -> Hash {
    triehash::ordered_trie_root::<ChainKeccakHasher, _>(rlp_items)
}
