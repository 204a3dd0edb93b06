//! The write-through cache layered over a `Store` for the duration of one
//! logical write (one block admission, or one stability-advance step).
//!
//! Reads check the dirty map, then the clean map, then fall through to the
//! store and populate the clean map on miss. Writes only ever land in the
//! dirty map. `commit` flushes the dirty map to the store and clears it;
//! nothing written becomes visible to a fresh `Cache` until that happens.
//! Callers must deep-copy a value retrieved via `get` before mutating it
//! and writing it back -- the cache hands out owned clones, not references
//! into its maps, so this is enforced by the type system rather than by
//! convention.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CResult;
use crate::store::{ColumnFamily, Store};

#[derive(Default)]
struct Family {
    clean: HashMap<Vec<u8>, Vec<u8>>,
    dirty: HashMap<Vec<u8>, Option<Vec<u8>>>,
}

pub struct Cache<'s, S: Store> {
    store: &'s mut S,
    families: HashMap<ColumnFamily, Family>,
}

impl<'s, S: Store> Cache<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store, families: HashMap::new() }
    }

    fn family(&mut self, cf: ColumnFamily) -> &mut Family {
        self.families.entry(cf).or_default()
    }

    pub fn get<T: DeserializeOwned>(&mut self, cf: ColumnFamily, key: &[u8]) -> CResult<Option<T>> {
        if let Some(entry) = self.family(cf).dirty.get(key) {
            return match entry {
                Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
                None => Ok(None),
            };
        }
        if let Some(bytes) = self.family(cf).clean.get(key) {
            return Ok(Some(bincode::deserialize(bytes)?));
        }
        match self.store.get_raw(cf, key)? {
            Some(bytes) => {
                let value = bincode::deserialize(&bytes)?;
                self.family(cf).clean.insert(key.to_vec(), bytes);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub fn put<T: Serialize>(&mut self, cf: ColumnFamily, key: &[u8], value: &T) -> CResult<()> {
        let bytes = bincode::serialize(value)?;
        self.family(cf).dirty.insert(key.to_vec(), Some(bytes));
        Ok(())
    }

    pub fn delete(&mut self, cf: ColumnFamily, key: &[u8]) {
        self.family(cf).dirty.insert(key.to_vec(), None);
    }

    /// Every key/value pair under `prefix` in `cf`, merging committed store
    /// state with this cache's still-uncommitted writes.
    pub fn scan_prefix<T: DeserializeOwned>(
        &mut self,
        cf: ColumnFamily,
        prefix: &[u8],
    ) -> CResult<Vec<(Vec<u8>, T)>> {
        let mut merged: HashMap<Vec<u8>, Option<Vec<u8>>> = HashMap::new();
        for (k, v) in self.store.scan_prefix_raw(cf, prefix)? {
            merged.insert(k, Some(v));
        }
        for (k, v) in self.family(cf).dirty.iter() {
            if k.starts_with(prefix) {
                merged.insert(k.clone(), v.clone());
            }
        }
        let mut out = Vec::new();
        for (k, v) in merged {
            if let Some(bytes) = v {
                out.push((k, bincode::deserialize(&bytes)?));
            }
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    /// Flushes the dirty map to the underlying store and commits it.
    pub fn commit(mut self) -> CResult<()> {
        for (cf, family) in self.families.drain() {
            for (key, value) in family.dirty {
                match value {
                    Some(bytes) => self.store.put_raw(cf, &key, bytes)?,
                    None => self.store.delete_raw(cf, &key)?,
                }
            }
        }
        self.store.commit()
    }

    /// The "timeout transaction" of `§4.1`: flushes the dirty map to the
    /// store and commits, the same as `commit`, but keeps the `Cache`
    /// alive afterwards by folding the flushed entries into the clean map
    /// instead of consuming `self`. A long `try_advance` loop calls this
    /// between MCI steps, and block admission calls it after each block,
    /// so each is its own durable unit (`§5`): the caller may observe its
    /// own intermediate commits, but nothing is held open across them.
    pub fn checkpoint(&mut self) -> CResult<()> {
        for (cf, family) in self.families.iter_mut() {
            for (key, value) in family.dirty.drain() {
                match value {
                    Some(bytes) => {
                        self.store.put_raw(*cf, &key, bytes.clone())?;
                        family.clean.insert(key, bytes);
                    }
                    None => {
                        self.store.delete_raw(*cf, &key)?;
                        family.clean.remove(&key);
                    }
                }
            }
        }
        self.store.commit()
    }
}
