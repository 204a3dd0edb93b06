//! The versioned account cache the executor runs against: owned value
//! types plus an explicit read-through cache and a change log, rather than
//! the shared-pointer-with-deep-copy-before-mutate convention the engine
//! this was ported from relies on (see the design notes on eliminating
//! aliasing hazards).

use std::collections::HashMap;

use crate::cache::Cache;
use crate::error::CResult;
use crate::store::{keys, ColumnFamily, Store};
use crate::types::{Address, AccountState, Hash};

/// One reversible mutation. Reverting a checkpoint replays these in
/// reverse order back to the point the checkpoint was taken.
enum Change {
    Balance { address: Address, prior: AccountState },
    Nonce { address: Address, prior: AccountState },
    Storage { address: Address, key: Hash, prior: Option<Hash> },
    Code { address: Address, prior_code: Option<Vec<u8>>, prior_account: AccountState },
    Create { address: Address },
    Touch { address: Address },
}

/// A versioned account + storage cache local to one block's worth of
/// transaction execution. Commits flush to the underlying `Cache`;
/// reverts discard everything back to a checkpoint without touching it.
#[derive(Default)]
pub struct ExecutionState {
    accounts: HashMap<Address, AccountState>,
    /// Addresses known (from a prior lookup) not to exist, so repeated
    /// lookups of nonexistent accounts don't keep hitting the store.
    negative: std::collections::HashSet<Address>,
    storage: HashMap<(Address, Hash), Hash>,
    code: HashMap<Address, Vec<u8>>,
    touched: std::collections::HashSet<Address>,
    change_log: Vec<Change>,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current change-log length, usable with
    /// `revert_to_checkpoint`/`discard_checkpoint`.
    pub fn checkpoint(&self) -> usize {
        self.change_log.len()
    }

    pub fn discard_checkpoint(&mut self, _checkpoint: usize) {
        // No-op: a discard just means the caller won't be rolling back to
        // this point. The log entries stay, folded into whatever
        // checkpoint (if any) encloses this one.
    }

    pub fn revert_to_checkpoint(&mut self, checkpoint: usize) {
        while self.change_log.len() > checkpoint {
            match self.change_log.pop().unwrap() {
                Change::Balance { address, prior } | Change::Nonce { address, prior } => {
                    self.accounts.insert(address, prior);
                }
                Change::Storage { address, key, prior } => match prior {
                    Some(v) => {
                        self.storage.insert((address, key), v);
                    }
                    None => {
                        self.storage.remove(&(address, key));
                    }
                },
                Change::Code { address, prior_code, prior_account } => {
                    match prior_code {
                        Some(c) => {
                            self.code.insert(address, c);
                        }
                        None => {
                            self.code.remove(&address);
                        }
                    }
                    self.accounts.insert(address, prior_account);
                }
                Change::Create { address } => {
                    self.accounts.remove(&address);
                    self.touched.remove(&address);
                }
                Change::Touch { address } => {
                    self.touched.remove(&address);
                }
            }
        }
    }

    fn load<S: Store>(&mut self, cache: &mut Cache<S>, address: Address) -> CResult<AccountState> {
        if let Some(acc) = self.accounts.get(&address) {
            return Ok(acc.clone());
        }
        if self.negative.contains(&address) {
            return Ok(AccountState::empty());
        }
        match cache.get::<AccountState>(ColumnFamily::AccountState, address.as_bytes())? {
            Some(acc) => {
                self.accounts.insert(address, acc.clone());
                Ok(acc)
            }
            None => {
                self.negative.insert(address);
                Ok(AccountState::empty())
            }
        }
    }

    pub fn account<S: Store>(&mut self, cache: &mut Cache<S>, address: Address) -> CResult<AccountState> {
        self.load(cache, address)
    }

    pub fn nonce<S: Store>(&mut self, cache: &mut Cache<S>, address: Address) -> CResult<crate::types::U256> {
        Ok(self.load(cache, address)?.nonce)
    }

    fn touch(&mut self, address: Address) {
        if self.touched.insert(address) {
            self.change_log.push(Change::Touch { address });
        }
    }

    pub fn set_nonce<S: Store>(
        &mut self,
        cache: &mut Cache<S>,
        address: Address,
        nonce: crate::types::U256,
    ) -> CResult<()> {
        let prior = self.load(cache, address)?;
        self.change_log.push(Change::Nonce { address, prior: prior.clone() });
        self.negative.remove(&address);
        self.accounts.insert(address, AccountState { nonce, ..prior });
        self.touch(address);
        Ok(())
    }

    pub fn inc_nonce<S: Store>(&mut self, cache: &mut Cache<S>, address: Address) -> CResult<()> {
        let n = self.nonce(cache, address)?;
        self.set_nonce(cache, address, n + 1)
    }

    pub fn balance<S: Store>(&mut self, cache: &mut Cache<S>, address: Address) -> CResult<crate::types::U256> {
        Ok(self.load(cache, address)?.balance)
    }

    pub fn add_balance<S: Store>(
        &mut self,
        cache: &mut Cache<S>,
        address: Address,
        amount: crate::types::U256,
    ) -> CResult<()> {
        let prior = self.load(cache, address)?;
        self.change_log.push(Change::Balance { address, prior: prior.clone() });
        self.negative.remove(&address);
        self.accounts.insert(address, AccountState { balance: prior.balance + amount, ..prior });
        self.touch(address);
        Ok(())
    }

    pub fn sub_balance<S: Store>(
        &mut self,
        cache: &mut Cache<S>,
        address: Address,
        amount: crate::types::U256,
    ) -> CResult<()> {
        let prior = self.load(cache, address)?;
        self.change_log.push(Change::Balance { address, prior: prior.clone() });
        self.negative.remove(&address);
        self.accounts.insert(address, AccountState { balance: prior.balance - amount, ..prior });
        self.touch(address);
        Ok(())
    }

    pub fn transfer_balance<S: Store>(
        &mut self,
        cache: &mut Cache<S>,
        from: Address,
        to: Address,
        amount: crate::types::U256,
    ) -> CResult<()> {
        self.sub_balance(cache, from, amount)?;
        self.add_balance(cache, to, amount)
    }

    pub fn create_account<S: Store>(&mut self, cache: &mut Cache<S>, address: Address) -> CResult<()> {
        let _ = self.load(cache, address)?;
        self.change_log.push(Change::Create { address });
        self.accounts.insert(address, AccountState::empty());
        self.touch(address);
        Ok(())
    }

    pub fn set_code<S: Store>(&mut self, cache: &mut Cache<S>, address: Address, code: Vec<u8>) -> CResult<()> {
        let prior_account = self.load(cache, address)?;
        let prior_code = self.code.get(&address).cloned();
        self.change_log.push(Change::Code { address, prior_code, prior_account: prior_account.clone() });
        let code_hash = crate::hash::keccak256(&code);
        self.accounts.insert(address, AccountState { code_hash, ..prior_account });
        self.code.insert(address, code);
        self.touch(address);
        Ok(())
    }

    pub fn code_size<S: Store>(&mut self, cache: &mut Cache<S>, address: Address) -> CResult<usize> {
        if let Some(c) = self.code.get(&address) {
            return Ok(c.len());
        }
        let acc = self.load(cache, address)?;
        if acc.code_hash.is_zero() {
            return Ok(0);
        }
        Ok(cache.get::<Vec<u8>>(ColumnFamily::AccountState, acc.code_hash.as_bytes())?.map(|c| c.len()).unwrap_or(0))
    }

    pub fn set_storage<S: Store>(
        &mut self,
        cache: &mut Cache<S>,
        address: Address,
        key: Hash,
        value: Hash,
    ) -> CResult<()> {
        let prior = self.storage_get(cache, address, key)?;
        self.change_log.push(Change::Storage { address, key, prior: Some(prior) });
        self.storage.insert((address, key), value);
        self.touch(address);
        Ok(())
    }

    fn storage_get<S: Store>(&mut self, cache: &mut Cache<S>, address: Address, key: Hash) -> CResult<Hash> {
        if let Some(v) = self.storage.get(&(address, key)) {
            return Ok(*v);
        }
        let storage_key = keys::account_storage_key(address, key);
        let v = cache.get::<Hash>(ColumnFamily::AccountState, &storage_key)?.unwrap_or_default();
        self.storage.insert((address, key), v);
        Ok(v)
    }

    /// Reads a storage slot without journaling it as a change; used by
    /// callers that only need the current value (the precompile dispatch
    /// seam never calls `set_storage`, but a future bytecode interpreter
    /// reading a slot before writing it would go through this).
    pub fn storage<S: Store>(&mut self, cache: &mut Cache<S>, address: Address, key: Hash) -> CResult<Hash> {
        self.storage_get(cache, address, key)
    }

    /// EIP-161-style: accounts touched this execution with no balance, no
    /// nonce and no code are dropped rather than persisted.
    pub fn remove_empty_accounts(&mut self) {
        let empty: Vec<Address> =
            self.touched.iter().filter(|a| self.accounts.get(a).is_some_and(|acc| acc.is_empty())).copied().collect();
        for a in empty {
            self.accounts.remove(&a);
        }
    }

    /// Flushes touched accounts, code and storage to the block cache and
    /// clears all in-flight execution state.
    pub fn commit<S: Store>(&mut self, cache: &mut Cache<S>) -> CResult<()> {
        self.remove_empty_accounts();
        for (address, account) in self.accounts.drain() {
            cache.put(ColumnFamily::AccountState, address.as_bytes(), &account)?;
        }
        for (address, code) in self.code.drain() {
            let hash = crate::hash::keccak256(&code);
            cache.put(ColumnFamily::AccountState, hash.as_bytes(), &code)?;
        }
        for ((address, key), value) in self.storage.drain() {
            let storage_key = keys::account_storage_key(address, key);
            cache.put(ColumnFamily::AccountState, &storage_key, &value)?;
        }
        self.negative.clear();
        self.touched.clear();
        self.change_log.clear();
        Ok(())
    }
}
