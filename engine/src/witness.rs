//! Witness rotation: VRF-ranked selection of the witness set for the next
//! epoch, and the epoch parameters that `dag` consults to compute
//! witnessed level.

use serde_derive::{Deserialize, Serialize};

use crate::cache::Cache;
use crate::config::NodeConfig;
use crate::error::{CResult, ChainError};
use crate::store::{keys, ColumnFamily, Store};
use crate::types::{Address, ApprovalReceipt, Hash};

/// The witness set and majority threshold effective for one epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessParam {
    pub witness_count: usize,
    pub majority: usize,
    pub witness_list: Vec<Address>,
}

impl WitnessParam {
    pub fn is_witness(&self, addr: &Address) -> bool {
        self.witness_list.contains(addr)
    }
}

pub fn epoch_of(mci: u64, epoch_period: u64) -> u64 {
    mci / epoch_period
}

fn witness_param_key(epoch: u64) -> Vec<u8> {
    let mut k = b"witness_param/".to_vec();
    k.extend_from_slice(&keys::epoch_key(epoch));
    k
}

fn last_stable_epoch_key() -> &'static [u8] {
    b"last_stable_epoch"
}

pub fn load_witness_param<S: Store>(cache: &mut Cache<S>, epoch: u64) -> CResult<Option<WitnessParam>> {
    cache.get(ColumnFamily::Metadata, &witness_param_key(epoch))
}

pub fn store_witness_param<S: Store>(cache: &mut Cache<S>, epoch: u64, param: &WitnessParam) -> CResult<()> {
    cache.put(ColumnFamily::Metadata, &witness_param_key(epoch), param)
}

/// Publishes the genesis witness list as the effective set for epochs 0
/// and 1, before the first rotation has had a chance to run.
pub fn install_genesis_witness_param<S: Store>(cache: &mut Cache<S>, config: &NodeConfig) -> CResult<()> {
    let param = WitnessParam {
        witness_count: config.witness_count,
        majority: config.majority(),
        witness_list: config.genesis_witness_list.clone(),
    };
    store_witness_param(cache, 0, &param)?;
    store_witness_param(cache, 1, &param)?;
    cache.put(ColumnFamily::Metadata, b"epoch_period", &config.epoch_period)?;
    Ok(())
}

/// Records one approval's VRF output against the epoch it targets, ordered
/// for later descending-by-output retrieval.
pub fn record_vrf_output<S: Store>(
    cache: &mut Cache<S>,
    epoch: u64,
    receipt: &ApprovalReceipt,
) -> CResult<()> {
    let mut sender_padded = [0u8; 32];
    sender_padded[12..].copy_from_slice(receipt.from.as_bytes());
    let key = keys::vrf_output_key(epoch, receipt.output, Hash::from(sender_padded));
    cache.put(ColumnFamily::VrfOutputs, &key, receipt)
}

/// At each stable MCI, checks whether a new epoch has begun and, if so,
/// rotates the witness list two epochs ahead (see `§4.9`).
pub fn try_rotate_witnesses<S: Store>(
    cache: &mut Cache<S>,
    config: &NodeConfig,
    mc_last_summary_mci: u64,
) -> CResult<()> {
    let epoch = epoch_of(mc_last_summary_mci, config.epoch_period);
    let last_stable_epoch: u64 = cache.get(ColumnFamily::Metadata, last_stable_epoch_key())?.unwrap_or(0);
    if epoch == 0 || epoch == last_stable_epoch {
        return Ok(());
    }

    let vrf_epoch = epoch - 1;
    let use_epoch = epoch + 1;

    let outputs: Vec<(Vec<u8>, ApprovalReceipt)> =
        cache.scan_prefix(ColumnFamily::VrfOutputs, &keys::epoch_key(vrf_epoch))?;

    let new_param = if outputs.len() < config.witness_count {
        log::warn!(
            "epoch {vrf_epoch}: only {have} vrf outputs collected, need {need}; republishing current witness set for epoch {use_epoch}",
            have = outputs.len(),
            need = config.witness_count,
        );
        load_witness_param(cache, epoch)?.unwrap_or_else(|| WitnessParam {
            witness_count: config.witness_count,
            majority: config.majority(),
            witness_list: config.genesis_witness_list.clone(),
        })
    } else {
        // `outputs` is ascending by (epoch, output, sender); take the tail
        // for the highest `witness_count` VRF outputs.
        let mut senders: Vec<Address> = outputs
            .iter()
            .rev()
            .take(config.witness_count)
            .map(|(_, r)| r.from)
            .collect();
        senders.sort();
        senders.dedup();
        if senders.len() != config.witness_count {
            return Err(ChainError::NotEnoughWitnesses {
                epoch: vrf_epoch,
                need: config.witness_count,
                have: senders.len(),
            });
        }
        WitnessParam { witness_count: config.witness_count, majority: config.majority(), witness_list: senders }
    };

    store_witness_param(cache, use_epoch, &new_param)?;

    for (key, _) in outputs {
        cache.delete(ColumnFamily::VrfOutputs, &key);
    }
    cache.put(ColumnFamily::Metadata, last_stable_epoch_key(), &epoch)?;

    log::info!("rotated witness set for epoch {use_epoch}: {} witnesses", new_param.witness_list.len());
    Ok(())
}
