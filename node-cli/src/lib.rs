//! `node-cli` is a thin operator surface over the chain engine: it loads a
//! `NodeConfig`, wires up logging, and drives `chain::init` / `chain::try_advance`
//! against a fresh in-process store. It carries no consensus logic of its
//! own -- every decision it prints comes from the engine's public API.

pub mod config;
pub mod trace;
