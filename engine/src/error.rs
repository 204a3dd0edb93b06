//! Typed errors for every fallible operation in the chain engine.
//!
//! Variants correspond to the error classes a component can raise: transient
//! store failures are wrapped and propagated, consensus violations abort the
//! enclosing write, and per-transaction execution failures are reported as
//! receipts rather than propagated (see `executor`).

use primitive_types::H256;

/// Crate-wide result alias. Every fallible operation in the engine returns
/// this rather than threading a bespoke error type per module.
pub type CResult<T> = Result<T, ChainError>;

#[derive(thiserror::Error, Debug)]
pub enum ChainError {
    #[error("store error: {0}")]
    Store(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("main chain would retreat below the stable frontier: stable_mci={stable}, attempted={attempted}")]
    StableRetreat { stable: u64, attempted: u64 },

    #[error("block {0:#x} is already stable")]
    AlreadyStable(H256),

    #[error("no block state recorded for {0:#x}")]
    MissingState(H256),

    #[error("no block recorded for {0:#x}")]
    MissingBlock(H256),

    #[error("last_summary_block {0:#x} is not a stable, on-main ancestor")]
    InvalidSummaryAnchor(H256),

    #[error("witness set for epoch {epoch} needs {need} addresses, only {have} VRF outputs were collected")]
    NotEnoughWitnesses { epoch: u64, need: usize, have: usize },

    #[error("vm exception during transaction {tx:#x}: {reason}")]
    VmException { tx: H256, reason: String },

    #[error("genesis initialisation failed: {0}")]
    GenesisInit(String),

    #[error("invariant violation: {0}")]
    Invariant(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<rlp::DecoderError> for ChainError {
    fn from(e: rlp::DecoderError) -> Self {
        ChainError::Codec(e.to_string())
    }
}

impl From<bincode::Error> for ChainError {
    fn from(e: bincode::Error) -> Self {
        ChainError::Codec(e.to_string())
    }
}

impl From<std::io::Error> for ChainError {
    fn from(e: std::io::Error) -> Self {
        ChainError::Store(e.to_string())
    }
}
