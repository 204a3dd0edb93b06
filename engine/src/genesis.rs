//! Genesis bootstrap (`§8` scenario 1): seeds an empty store with the one
//! block every chain starts from, before any block is ever routed through
//! the DAG writer.
//!
//! Genesis has no parents and no predecessor to validate against, so it
//! is constructed and marked stable directly rather than through
//! `dag::write_dag_block` / `summary::set_block_stable`.

use crate::cache::Cache;
use crate::config::NodeConfig;
use crate::error::CResult;
use crate::hash::keccak256;
use crate::store::{keys, ColumnFamily, Store};
use crate::types::{address_root, AccountState, Address, Block, BlockState, Hash};
use crate::witness;

/// Addresses `1..=8` are reserved for the precompiled contracts (`§6`) and
/// exist from genesis with an empty account, so the executor never has to
/// special-case a missing account at those addresses.
const PRECOMPILE_COUNT: u8 = 8;

/// Derives the genesis hash from the consensus parameters it fixes, so
/// every node bootstrapped from the same `NodeConfig` agrees on genesis
/// without exchanging it over the wire.
fn genesis_hash(config: &NodeConfig) -> Hash {
    let mut stream = rlp::RlpStream::new_list(3);
    stream.append(&config.witness_count);
    stream.append(&config.epoch_period);
    stream.append_list(&config.genesis_witness_list);
    keccak256(&stream.out())
}

/// Bootstraps an empty store into a running chain. Must run exactly once,
/// against a store with no prior `Metadata` entries; returns the genesis
/// hash.
pub fn bootstrap<S: Store>(cache: &mut Cache<S>, config: &NodeConfig) -> CResult<Hash> {
    let hash = genesis_hash(config);

    let block = Block {
        hash,
        previous: Hash::zero(),
        parents: Vec::new(),
        links: Vec::new(),
        approves: Vec::new(),
        last_summary_block: hash,
        last_stable_block: hash,
        from: Address::zero(),
        exec_timestamp: 0,
    };
    cache.put(ColumnFamily::Block, &keys::hash_key(hash), &block)?;
    cache.put(ColumnFamily::BlockState, &keys::hash_key(hash), &BlockState::genesis())?;

    cache.put(ColumnFamily::MainChain, &keys::mci_key(0), &hash)?;
    cache.put(ColumnFamily::StableIndex, &keys::u64_be(0), &hash)?;
    cache.put(ColumnFamily::Successor, &keys::hash_key(address_root(Address::zero())), &hash)?;
    cache.put(ColumnFamily::DagAccount, Address::zero().as_bytes(), &hash)?;

    // Genesis summarises itself: there is no predecessor summary to chain
    // from and no receipts to root.
    let summary_hash = keccak256(hash.as_bytes());
    cache.put(ColumnFamily::Summary, &keys::hash_key(hash), &summary_hash)?;
    cache.put(ColumnFamily::SummaryBlock, &keys::hash_key(summary_hash), &hash)?;

    for i in 1..=PRECOMPILE_COUNT {
        let mut address_bytes = [0u8; 20];
        address_bytes[19] = i;
        let address = Address::from(address_bytes);
        cache.put(ColumnFamily::AccountState, address.as_bytes(), &AccountState::empty())?;
    }

    witness::install_genesis_witness_param(cache, config)?;

    cache.put(ColumnFamily::Metadata, b"genesis_hash", &hash)?;
    cache.put(ColumnFamily::Metadata, b"last_mci", &0u64)?;
    cache.put(ColumnFamily::Metadata, b"last_stable_mci", &0u64)?;
    cache.put(ColumnFamily::Metadata, b"last_stable_index", &0u64)?;
    cache.put(ColumnFamily::Metadata, b"min_retrievable_mci", &0u64)?;
    cache.put(ColumnFamily::Metadata, b"transaction_count", &0u64)?;
    cache.put(ColumnFamily::Metadata, b"transaction_unstable_count", &0u64)?;
    cache.put(ColumnFamily::Metadata, b"approve_count", &0u64)?;
    cache.put(ColumnFamily::Metadata, b"approve_unstable_count", &0u64)?;
    cache.put(ColumnFamily::Metadata, b"advance_info", &(0u64, hash))?;

    Ok(hash)
}

#[cfg(test)]
mod tests {
    use crate::store::memory::MemoryStore;

    use super::*;

    #[test]
    fn bootstrap_seeds_genesis_and_precompiles() {
        let mut store = MemoryStore::new();
        let mut cache = Cache::new(&mut store);
        let config = NodeConfig::default();

        let hash = bootstrap(&mut cache, &config).unwrap();

        let main_chain_0: Hash = cache.get(ColumnFamily::MainChain, &keys::mci_key(0)).unwrap().unwrap();
        assert_eq!(main_chain_0, hash);

        let state: BlockState = cache.get(ColumnFamily::BlockState, &keys::hash_key(hash)).unwrap().unwrap();
        assert!(state.is_stable);
        assert!(state.is_on_main_chain);
        assert_eq!(state.main_chain_index, Some(0));

        for i in 1..=PRECOMPILE_COUNT {
            let mut address_bytes = [0u8; 20];
            address_bytes[19] = i;
            let address = Address::from(address_bytes);
            let account: AccountState = cache.get(ColumnFamily::AccountState, address.as_bytes()).unwrap().unwrap();
            assert!(account.is_empty());
        }

        let last_mci: u64 = cache.get(ColumnFamily::Metadata, b"last_mci").unwrap().unwrap();
        assert_eq!(last_mci, 0);
    }

    #[test]
    fn bootstrap_is_deterministic_given_the_same_config() {
        let config = NodeConfig::default();

        let mut store_a = MemoryStore::new();
        let mut cache_a = Cache::new(&mut store_a);
        let hash_a = bootstrap(&mut cache_a, &config).unwrap();

        let mut store_b = MemoryStore::new();
        let mut cache_b = Cache::new(&mut store_b);
        let hash_b = bootstrap(&mut cache_b, &config).unwrap();

        assert_eq!(hash_a, hash_b);
    }
}
