//! The precompiled-contract dispatch seam (`§4.7`): addresses `0x01..=0x08`
//! are reserved for the standard Ethereum precompiles. This crate prices
//! them and routes calls to them, but does not implement the elliptic
//! curve and hash-function primitives themselves -- `identity` is the one
//! precompile simple enough to implement directly; the rest are a
//! dispatch seam for a real cryptography backend to plug into.

use primitive_types::U256;

use crate::config::PrecompileGas;
use crate::error::{CResult, ChainError};
use crate::executor::gas::cost_of_precompiled;
use crate::types::{Address, Hash};

/// Addresses the executor routes to precompiled logic instead of
/// executing contract code.
pub trait Precompiles {
    fn is_precompiled(&self, address: &Address) -> bool;

    fn cost_of_precompiled(&self, address: &Address, input: &[u8]) -> U256;

    /// Runs the precompile, returning its output on success. The caller
    /// treats `Err` the same as any other VM exception: roll back to the
    /// pre-call savepoint.
    fn execute_precompiled(&self, address: &Address, input: &[u8], tx_hash: Hash) -> CResult<Vec<u8>>;
}

/// The standard eight precompiles at addresses `1..=8`, priced from
/// `PrecompileGas` and implemented only for `identity` (address 4).
pub struct StandardPrecompiles {
    schedule: PrecompileGas,
}

impl StandardPrecompiles {
    pub fn new(schedule: PrecompileGas) -> Self {
        Self { schedule }
    }

    fn address_byte(address: &Address) -> Option<u8> {
        let bytes = address.as_bytes();
        if bytes[..19].iter().any(|&b| b != 0) {
            return None;
        }
        match bytes[19] {
            n @ 1..=8 => Some(n),
            _ => None,
        }
    }
}

impl Precompiles for StandardPrecompiles {
    fn is_precompiled(&self, address: &Address) -> bool {
        Self::address_byte(address).is_some()
    }

    fn cost_of_precompiled(&self, address: &Address, input: &[u8]) -> U256 {
        match Self::address_byte(address) {
            Some(n) => cost_of_precompiled(&self.schedule, n, input),
            None => U256::zero(),
        }
    }

    fn execute_precompiled(&self, address: &Address, input: &[u8], tx_hash: Hash) -> CResult<Vec<u8>> {
        match Self::address_byte(address) {
            Some(4) => Ok(input.to_vec()),
            Some(n) => Err(ChainError::VmException {
                tx: tx_hash,
                reason: format!("precompile {n} has no cryptographic backend wired in"),
            }),
            None => Err(ChainError::VmException { tx: tx_hash, reason: "not a precompiled address".into() }),
        }
    }
}
