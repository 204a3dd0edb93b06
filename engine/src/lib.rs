//! `chain-engine` is a permissionless DAG-based blockchain engine: blocks
//! form a directed acyclic graph rather than a linear chain, and a main
//! chain is selected from it by recursive best-parent walks over
//! witnessed level. A stability advancer finalises main-chain blocks in
//! batches, executing their linked transactions against an EVM-style
//! account-state machine and chaining a running summary hash over the
//! result. Witnesses rotate every epoch by VRF-ranked approval.
//!
//! ## Control flow
//!
//! 1. [`chain::init`] bootstraps an empty store with the genesis block.
//! 2. [`chain::submit_transaction`] / [`chain::submit_approval`] persist
//!    loose entities so a future block can link them.
//! 3. [`chain::ingest_block`] admits one validated block: the DAG writer
//!    ([`dag`]) links it in, the main-chain selector ([`main_chain`])
//!    recomputes the best free tip, and the latest-included-MCI fixpoint
//!    ([`limci`]) refreshes bounds for the affected subtree.
//! 4. [`chain::try_advance`] walks the stable frontier forward, executing
//!    newly-stable transactions/approvals through [`executor`], rooting
//!    their receipts with [`trie`], finalising each block through
//!    [`summary`], and rotating witnesses through [`witness`] at epoch
//!    boundaries.
//!
//! ## Getting started
//!
//! ```rust
//! use chain_engine::cache::Cache;
//! use chain_engine::chain;
//! use chain_engine::config::NodeConfig;
//! use chain_engine::executor::precompiles::StandardPrecompiles;
//! use chain_engine::store::memory::MemoryStore;
//!
//! let mut store = MemoryStore::new();
//! let mut cache = Cache::new(&mut store);
//! let config = NodeConfig::default();
//!
//! let genesis_hash = chain::init(&mut cache, &config).unwrap();
//! let precompiles = StandardPrecompiles::new(config.precompile_gas.clone());
//! let stabilised = chain::try_advance(&mut cache, &config, &precompiles).unwrap();
//! assert_eq!(stabilised, 0);
//! ```

pub mod advance;
pub mod cache;
pub mod chain;
pub mod config;
pub mod dag;
pub mod error;
pub mod executor;
pub mod genesis;
pub mod hash;
pub mod limci;
pub mod main_chain;
pub mod storage;
pub mod store;
pub mod summary;
pub mod trie;
pub mod types;
pub mod vrf;
pub mod witness;
