//! The transactional key/value façade every other component is built on.
//!
//! `Store` partitions a single byte-string keyspace (provided by the
//! `storage::engine::Engine` trait) into named column families, the way the
//! column-family-per-concern layout of `§6` requires, and adds typed
//! get/put on top of raw bytes. A concrete backend only has to implement
//! `get_raw`/`put_raw`/`delete_raw`/`scan_prefix_raw`/`commit`; the typed
//! helpers and the CF key prefixing are provided once, here.

pub mod keys;
pub mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CResult;

/// Column families, one per persisted concern in the data model.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ColumnFamily {
    Block = 0,
    BlockState = 1,
    MainChain = 2,
    DagFree = 3,
    BlockChild = 4,
    Successor = 5,
    Summary = 6,
    SummaryBlock = 7,
    Skiplist = 8,
    Transaction = 9,
    TransactionReceipt = 10,
    TransactionAddress = 11,
    Approve = 12,
    ApproveReceipt = 13,
    AccountState = 14,
    AccountNonce = 15,
    VrfOutputs = 16,
    Metadata = 17,
    /// `stable_index u64 → hash32`, the canonical finalisation-order index
    /// assigned by the summariser (`§4.8`); one entry per stable block,
    /// independent of main-chain membership.
    StableIndex = 18,
    /// `sender20 → hash32`, the latest block each sender has stabilised
    /// with an `ok` fork status. Consulted by block admission to validate
    /// a sender's next `previous` pointer.
    DagAccount = 19,
}

/// A transactional, column-family-partitioned key/value store.
///
/// All methods take `&mut self`: like the storage engine it wraps, a store
/// only ever serves a single writer at a time (see the concurrency model).
pub trait Store {
    fn get_raw(&mut self, cf: ColumnFamily, key: &[u8]) -> CResult<Option<Vec<u8>>>;

    fn put_raw(&mut self, cf: ColumnFamily, key: &[u8], value: Vec<u8>) -> CResult<()>;

    fn delete_raw(&mut self, cf: ColumnFamily, key: &[u8]) -> CResult<()>;

    /// Every key/value pair in `cf` whose key starts with `prefix`, in
    /// ascending key order.
    fn scan_prefix_raw(&mut self, cf: ColumnFamily, prefix: &[u8]) -> CResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Flushes buffered writes to durable storage. Backed by an in-memory
    /// engine this is a no-op; an on-disk backend would fsync here.
    fn commit(&mut self) -> CResult<()>;

    fn get<T: DeserializeOwned>(&mut self, cf: ColumnFamily, key: &[u8]) -> CResult<Option<T>> {
        match self.get_raw(cf, key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put<T: Serialize>(&mut self, cf: ColumnFamily, key: &[u8], value: &T) -> CResult<()> {
        let bytes = bincode::serialize(value)?;
        self.put_raw(cf, key, bytes)
    }

    fn scan_prefix<T: DeserializeOwned>(
        &mut self,
        cf: ColumnFamily,
        prefix: &[u8],
    ) -> CResult<Vec<(Vec<u8>, T)>> {
        self.scan_prefix_raw(cf, prefix)?
            .into_iter()
            .map(|(k, v)| Ok((k, bincode::deserialize(&v)?)))
            .collect()
    }
}
