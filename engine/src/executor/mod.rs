//! The executor (`§4.7`): EVM-style execution of one transaction against
//! the versioned account cache of `state`, with gas accounting from `gas`
//! and precompile dispatch from `precompiles`.
//!
//! This crate consumes the *gas/result contract* of the eight standard
//! precompiles rather than implementing their cryptography (see the scope
//! note on precompiled-contract implementations): `execute_transaction`
//! routes a call at a precompiled address through `Precompiles`, and any
//! error it returns is treated the same as a VM exception -- roll back to
//! the entry savepoint and propagate, rather than soften into a receipt.

pub mod gas;
pub mod precompiles;
pub mod state;

use primitive_types::U256;

use crate::cache::Cache;
use crate::error::CResult;
use crate::executor::precompiles::Precompiles;
use crate::executor::state::ExecutionState;
use crate::hash::keccak256;
use crate::store::Store;
use crate::types::{create_sentinel, Receipt, ReceiptStatus, Transaction};

/// What happens to the accumulated mutations once a transaction has run.
/// Mirrors the source's `Permanence` enum (`§4.7`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Permanence {
    /// Flush to the block's `Cache` and clear the change log.
    Committed,
    /// Roll every mutation back; used by `estimate_gas` probes.
    Reverted,
    /// Leave the change log as-is, neither flushed nor rolled back; the
    /// caller decides later.
    Uncommitted,
}

/// Per-MCI context an executed transaction can observe. Exposed to
/// contract code in a full VM; consumed here only for receipt metadata.
#[derive(Copy, Clone, Debug)]
pub struct McInfo {
    pub stable_index: u64,
    pub mci: u64,
    pub mc_timestamp: u64,
    pub mc_last_summary_mci: u64,
}

const TX_OUT_OF_GAS_BASE: u64 = 21_000;

/// Executes one transaction (`§4.7`). Never returns `Err` for the two
/// "soft" gas failures (`NotEnoughCash`, `InvalidNonce`) -- those produce a
/// `Receipt` with `status = Failed` instead, matching the batch semantics
/// of the stability advancer (`§4.6`), which must keep processing the rest
/// of a block's links even after one fails. A precompile dispatch error is
/// the one path that still propagates as `Err`: it represents a real VM
/// exception, not a predictable gas failure, and rolls every mutation (gas
/// charge and nonce bump included) back to the entry savepoint first.
pub fn execute_transaction<S: Store, P: Precompiles>(
    cache: &mut Cache<S>,
    state: &mut ExecutionState,
    precompiles: &P,
    tx: &Transaction,
    _mc_info: McInfo,
    permanence: Permanence,
) -> CResult<Receipt> {
    let entry_checkpoint = state.checkpoint();
    let failed = |gas_used: U256| Receipt {
        tx_hash: tx.hash,
        status: ReceiptStatus::Failed,
        gas_used,
        contract_address: create_sentinel(),
    };

    let sender_nonce = state.nonce(cache, tx.from)?;
    if tx.nonce != sender_nonce {
        // InvalidNonce: discarded, no state change at all.
        return Ok(failed(U256::zero()));
    }

    let intrinsic = gas::intrinsic_gas(tx);
    let required = tx.value + tx.gas_limit * tx.gas_price;
    let balance = state.balance(cache, tx.from)?;
    if intrinsic > tx.gas_limit || balance < required {
        // NotEnoughCash: the §4.7 decided behaviour is that this failing
        // transaction consumes its own nonce slot exactly like a
        // successful one would -- the sender's next transaction must use
        // nonce `t.nonce + 1` (see DESIGN.md's resolution of the §9 open
        // question). No other state changes survive.
        state.inc_nonce(cache, tx.from)?;
        let receipt = failed(U256::zero());
        if permanence == Permanence::Committed {
            state.commit(cache)?;
        } else if permanence == Permanence::Reverted {
            state.revert_to_checkpoint(entry_checkpoint);
        }
        return Ok(receipt);
    }

    // Past this point the transaction is economically admissible: charge
    // gas upfront and consume the nonce. This checkpoint is where an
    // `OutOfGas`-style soft failure rolls back to (gas and nonce stick);
    // `entry_checkpoint` is where a genuine VM exception rolls back to
    // (nothing sticks).
    state.sub_balance(cache, tx.from, tx.gas_limit * tx.gas_price)?;
    state.inc_nonce(cache, tx.from)?;
    let post_charge_checkpoint = state.checkpoint();

    let result = run_body(cache, state, precompiles, tx, intrinsic);

    let receipt = match result {
        Ok(BodyOutcome::Success { gas_used, contract_address }) => {
            Receipt { tx_hash: tx.hash, status: ReceiptStatus::Success, gas_used, contract_address }
        }
        Ok(BodyOutcome::OutOfGas) => {
            state.revert_to_checkpoint(post_charge_checkpoint);
            failed(tx.gas_limit)
        }
        Err(e) => {
            // VM exception: unwind everything, including the gas charge
            // and nonce bump, and re-throw.
            state.revert_to_checkpoint(entry_checkpoint);
            return Err(e);
        }
    };

    match permanence {
        Permanence::Committed => state.commit(cache)?,
        Permanence::Reverted => state.revert_to_checkpoint(entry_checkpoint),
        Permanence::Uncommitted => {}
    }

    Ok(receipt)
}

enum BodyOutcome {
    Success { gas_used: U256, contract_address: crate::types::Address },
    OutOfGas,
}

/// Runs the value transfer plus, if the destination is a contract-creation
/// sentinel or a precompiled address, the corresponding side effect. There
/// is no general bytecode interpreter here (out of scope, `§1`); a
/// create-sentinel transaction deploys `tx.data` verbatim as the new
/// account's code rather than running init code.
fn run_body<S: Store, P: Precompiles>(
    cache: &mut Cache<S>,
    state: &mut ExecutionState,
    precompiles: &P,
    tx: &Transaction,
    intrinsic: U256,
) -> CResult<BodyOutcome> {
    if tx.is_create() {
        let sender_nonce = state.nonce(cache, tx.from)?;
        let contract_address = contract_creation_address(tx.from, sender_nonce);
        state.create_account(cache, contract_address)?;
        state.transfer_balance(cache, tx.from, contract_address, tx.value)?;
        if !tx.data.is_empty() {
            state.set_code(cache, contract_address, tx.data.clone())?;
        }
        return Ok(BodyOutcome::Success { gas_used: intrinsic, contract_address });
    }

    state.transfer_balance(cache, tx.from, tx.to, tx.value)?;

    if precompiles.is_precompiled(&tx.to) {
        let cost = precompiles.cost_of_precompiled(&tx.to, &tx.data);
        let gas_used = intrinsic + cost;
        if gas_used > available_gas(tx) {
            return Ok(BodyOutcome::OutOfGas);
        }
        precompiles.execute_precompiled(&tx.to, &tx.data, tx.hash)?;
        return Ok(BodyOutcome::Success { gas_used, contract_address: create_sentinel() });
    }

    Ok(BodyOutcome::Success { gas_used: intrinsic, contract_address: create_sentinel() })
}

fn available_gas(tx: &Transaction) -> U256 {
    tx.gas_limit
}

/// `keccak256(rlp(sender, nonce))[12..]`, the standard `CREATE` address
/// formula.
fn contract_creation_address(sender: crate::types::Address, nonce: U256) -> crate::types::Address {
    let mut stream = rlp::RlpStream::new_list(2);
    stream.append(&sender);
    stream.append(&nonce);
    let hash = keccak256(&stream.out());
    crate::types::Address::from_slice(&hash.as_bytes()[12..])
}

/// Binary-searches the minimal gas limit this transaction succeeds under
/// (`§4.7`). Each probe re-runs `execute_transaction` with a fresh
/// `ExecutionState` (so probes never see each other's mutations) and
/// `Permanence::Reverted`. Returns `(gas, found)`; `found` is `false` if no
/// probe in range ever succeeded.
pub fn estimate_gas<S: Store, P: Precompiles>(
    cache: &mut Cache<S>,
    precompiles: &P,
    tx: &Transaction,
    mc_info: McInfo,
    max_gas: U256,
) -> CResult<(U256, bool)> {
    let lo_bound = gas::intrinsic_gas(tx).max(U256::from(TX_OUT_OF_GAS_BASE));
    let hi_bound = max_gas.min(tx.gas_limit);

    let probe = |cache: &mut Cache<S>, gas_limit: U256| -> CResult<bool> {
        let mut probe_tx = tx.clone();
        probe_tx.gas_limit = gas_limit;
        let mut state = ExecutionState::new();
        match execute_transaction(cache, &mut state, precompiles, &probe_tx, mc_info, Permanence::Reverted) {
            Ok(receipt) => Ok(receipt.status == ReceiptStatus::Success),
            Err(_) => Ok(false),
        }
    };

    if lo_bound > hi_bound || !probe(cache, hi_bound)? {
        return Ok((hi_bound, false));
    }

    let mut lo = lo_bound;
    let mut hi = hi_bound;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if probe(cache, mid)? {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Ok((hi, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::precompiles::StandardPrecompiles;
    use crate::store::memory::MemoryStore;
    use crate::types::{Address, U256 as TU256};

    fn tx(from: Address, to: Address, nonce: u64, value: u64) -> Transaction {
        Transaction {
            hash: keccak256(&nonce.to_be_bytes()),
            from,
            to,
            nonce: TU256::from(nonce),
            value: TU256::from(value),
            gas_limit: TU256::from(100_000u64),
            gas_price: TU256::zero(),
            data: vec![],
        }
    }

    fn mc_info() -> McInfo {
        McInfo { stable_index: 1, mci: 1, mc_timestamp: 0, mc_last_summary_mci: 0 }
    }

    #[test]
    fn not_enough_cash_advances_nonce_without_moving_balance() {
        let mut store = MemoryStore::new();
        let mut cache = Cache::new(&mut store);
        let precompiles = StandardPrecompiles::new(crate::config::PrecompileGas::default());
        let alice = Address::from_low_u64_be(1);
        let bob = Address::from_low_u64_be(2);

        let mut state = ExecutionState::new();
        state.add_balance(&mut cache, alice, TU256::from(3u64)).unwrap();
        state.commit(&mut cache).unwrap();

        let mut state = ExecutionState::new();
        let t = tx(alice, bob, 0, 5);
        let receipt =
            execute_transaction(&mut cache, &mut state, &precompiles, &t, mc_info(), Permanence::Committed).unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Failed);
        assert_eq!(receipt.gas_used, TU256::zero());

        let alice_balance = cache.get::<crate::types::AccountState>(
            crate::store::ColumnFamily::AccountState,
            alice.as_bytes(),
        ).unwrap().unwrap().balance;
        assert_eq!(alice_balance, TU256::from(3u64));

        let alice_nonce = cache.get::<crate::types::AccountState>(
            crate::store::ColumnFamily::AccountState,
            alice.as_bytes(),
        ).unwrap().unwrap().nonce;
        assert_eq!(alice_nonce, TU256::from(1u64));
    }

    #[test]
    fn successful_transfer_moves_balance_and_nonce() {
        let mut store = MemoryStore::new();
        let mut cache = Cache::new(&mut store);
        let precompiles = StandardPrecompiles::new(crate::config::PrecompileGas::default());
        let alice = Address::from_low_u64_be(1);
        let bob = Address::from_low_u64_be(2);

        let mut state = ExecutionState::new();
        state.add_balance(&mut cache, alice, TU256::from(3u64)).unwrap();
        state.commit(&mut cache).unwrap();

        let mut state = ExecutionState::new();
        let t = tx(alice, bob, 0, 2);
        let receipt =
            execute_transaction(&mut cache, &mut state, &precompiles, &t, mc_info(), Permanence::Committed).unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Success);

        let alice_balance = cache.get::<crate::types::AccountState>(
            crate::store::ColumnFamily::AccountState,
            alice.as_bytes(),
        ).unwrap().unwrap().balance;
        let bob_balance = cache.get::<crate::types::AccountState>(
            crate::store::ColumnFamily::AccountState,
            bob.as_bytes(),
        ).unwrap().unwrap().balance;
        assert_eq!(alice_balance, TU256::from(1u64));
        assert_eq!(bob_balance, TU256::from(2u64));
    }

    #[test]
    fn invalid_nonce_is_a_pure_discard() {
        let mut store = MemoryStore::new();
        let mut cache = Cache::new(&mut store);
        let precompiles = StandardPrecompiles::new(crate::config::PrecompileGas::default());
        let alice = Address::from_low_u64_be(1);
        let bob = Address::from_low_u64_be(2);

        let mut state = ExecutionState::new();
        let t = tx(alice, bob, 7, 1);
        let receipt =
            execute_transaction(&mut cache, &mut state, &precompiles, &t, mc_info(), Permanence::Committed).unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Failed);

        assert!(cache
            .get::<crate::types::AccountState>(crate::store::ColumnFamily::AccountState, alice.as_bytes())
            .unwrap()
            .is_none());
    }
}
