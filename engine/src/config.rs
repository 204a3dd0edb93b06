//! Consensus parameters that are constants in the specification but
//! configuration in practice: witness set size, epoch length, skip-list
//! fan-out and the genesis witness list. Loaded by the node CLI via
//! `confy` and overridable by CLI flags; the engine itself only consumes
//! the resulting `NodeConfig` value.

use primitive_types::H160;
use serde_derive::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Number of witnesses in a witness list.
    pub witness_count: usize,
    /// Number of MCIs per epoch; witness rotation checks epoch boundaries
    /// at `mci % epoch_period == 0`.
    pub epoch_period: u64,
    /// Base of the summary skip list: a back-pointer exists at every MCI
    /// divisible by `skiplist_divisor^k`.
    pub skiplist_divisor: u64,
    /// The witness list effective for epochs 0 and 1, before the first
    /// rotation has enough VRF outputs to replace it.
    pub genesis_witness_list: Vec<H160>,
    /// Gas prices for the eight precompiled contracts, in address order
    /// (1..=8). Kept overridable so test networks can price them cheaply.
    pub precompile_gas: PrecompileGas,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrecompileGas {
    pub ecrecover: u64,
    pub sha256_base: u64,
    pub sha256_word: u64,
    pub ripemd160_base: u64,
    pub ripemd160_word: u64,
    pub identity_base: u64,
    pub identity_word: u64,
    pub bn128_add: u64,
    pub bn128_mul: u64,
}

impl Default for PrecompileGas {
    fn default() -> Self {
        Self {
            ecrecover: 3000,
            sha256_base: 60,
            sha256_word: 12,
            ripemd160_base: 600,
            ripemd160_word: 120,
            identity_base: 15,
            identity_word: 3,
            bn128_add: 500,
            bn128_mul: 40_000,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            witness_count: 12,
            epoch_period: 100,
            skiplist_divisor: 10,
            genesis_witness_list: Vec::new(),
            precompile_gas: PrecompileGas::default(),
        }
    }
}

impl NodeConfig {
    pub fn majority(&self) -> usize {
        2 * self.witness_count / 3 + 1
    }
}
