//! VRF output derivation (`§4.6`, `§4.9`, `§6`): a deterministic ed25519
//! signature over the epoch seed, folded through Keccak into a ranking
//! value used to select the next epoch's witness set.
//!
//! This is not a true elliptic-curve VRF -- precompiled verifiable-random-
//! function backends are out of scope (`§1`) -- but a deterministic,
//! unforgeable-without-the-key stand-in: the signature already binds the
//! seed to the signer, so nothing but the signer can predict the output
//! before publishing it, and anyone can recompute it afterwards.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};

use crate::cache::Cache;
use crate::error::{CResult, ChainError};
use crate::hash::keccak256;
use crate::store::{keys, ColumnFamily, Store};
use crate::types::Hash;

/// The seed every approval in `epoch` signs over: `genesis_hash` for
/// `epoch <= 1`, else the main-chain block at `(epoch - 1) * epoch_period`
/// (`§6`'s VRF approval message).
pub fn epoch_seed<S: Store>(cache: &mut Cache<S>, epoch: u64, epoch_period: u64) -> CResult<Hash> {
    if epoch <= 1 {
        return cache
            .get(ColumnFamily::Metadata, b"genesis_hash")?
            .ok_or_else(|| ChainError::Invariant("genesis_hash not initialised".into()));
    }
    let mci = (epoch - 1) * epoch_period;
    cache.get(ColumnFamily::MainChain, &keys::mci_key(mci))?.ok_or_else(|| {
        ChainError::Invariant(format!("main chain block at mci {mci} missing for epoch seed"))
    })
}

/// Folds `seed ‖ signature` through Keccak-256 into the ranking value.
pub fn derive_output(seed: Hash, signature: &[u8]) -> Hash {
    let mut buf = Vec::with_capacity(32 + signature.len());
    buf.extend_from_slice(seed.as_bytes());
    buf.extend_from_slice(signature);
    keccak256(&buf)
}

/// Verifies an approval's signature against the sender's public key and,
/// if it checks out, returns the VRF output ranking it for witness
/// selection.
pub fn verify_and_derive(seed: Hash, verifying_key: &VerifyingKey, signature_bytes: &[u8]) -> CResult<Hash> {
    let sig_array: [u8; 64] =
        signature_bytes.try_into().map_err(|_| ChainError::Invariant("approval signature is not 64 bytes".into()))?;
    let signature = Signature::from_bytes(&sig_array);
    verifying_key
        .verify(seed.as_bytes(), &signature)
        .map_err(|_| ChainError::Invariant("approval signature does not verify".into()))?;
    Ok(derive_output(seed, signature_bytes))
}
