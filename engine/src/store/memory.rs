//! The default, in-process `Store` backend.
//!
//! Wraps the `storage::engine::Engine` trait -- the same pluggable-backend
//! seam the underlying key/value engine already exposed -- over a single
//! `Memory` instance, partitioning it into column families by prefixing
//! every key with a one-byte CF discriminant. Any other `Engine`
//! implementation (an on-disk log, an embedded B-tree) can back a `Store`
//! the same way.

use crate::error::CResult;
use crate::storage::engine::Engine;
use crate::storage::memory::Memory;
use crate::store::{ColumnFamily, Store};

pub struct MemoryStore<E: Engine = Memory> {
    engine: E,
}

impl MemoryStore<Memory> {
    pub fn new() -> Self {
        Self { engine: Memory::new() }
    }
}

impl Default for MemoryStore<Memory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Engine> MemoryStore<E> {
    pub fn from_engine(engine: E) -> Self {
        Self { engine }
    }

    fn prefixed(cf: ColumnFamily, key: &[u8]) -> Vec<u8> {
        let mut k = Vec::with_capacity(1 + key.len());
        k.push(cf as u8);
        k.extend_from_slice(key);
        k
    }
}

impl<E: Engine> Store for MemoryStore<E> {
    fn get_raw(&mut self, cf: ColumnFamily, key: &[u8]) -> CResult<Option<Vec<u8>>> {
        Ok(self.engine.get(&Self::prefixed(cf, key))?)
    }

    fn put_raw(&mut self, cf: ColumnFamily, key: &[u8], value: Vec<u8>) -> CResult<()> {
        Ok(self.engine.set(&Self::prefixed(cf, key), value)?)
    }

    fn delete_raw(&mut self, cf: ColumnFamily, key: &[u8]) -> CResult<()> {
        self.engine.delete(&Self::prefixed(cf, key))?;
        Ok(())
    }

    fn scan_prefix_raw(&mut self, cf: ColumnFamily, prefix: &[u8]) -> CResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let full_prefix = Self::prefixed(cf, prefix);
        let cf_len = 1;
        self.engine
            .scan_prefix(&full_prefix)
            .map(|item| {
                let (k, v) = item?;
                Ok((k[cf_len..].to_vec(), v))
            })
            .collect()
    }

    fn commit(&mut self) -> CResult<()> {
        Ok(self.engine.flush()?)
    }
}
