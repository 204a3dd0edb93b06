//! Loads the engine's `NodeConfig` via `confy`, with CLI flags serving as
//! overrides over the persisted file the way the teacher's CLI config
//! module layers flags over its own on-disk config.

use anyhow::{Context, Result};
use chain_engine::config::NodeConfig;

const APP_NAME: &str = "node-cli";
const CONFIG_NAME: &str = "node";

pub fn load(path: Option<&str>) -> Result<NodeConfig> {
    let config: NodeConfig = match path {
        Some(path) => confy::load_path(path).with_context(|| format!("loading config from {path}"))?,
        None => confy::load(APP_NAME, CONFIG_NAME).context("loading default config")?,
    };
    Ok(config)
}

pub fn store(config: &NodeConfig, path: Option<&str>) -> Result<()> {
    match path {
        Some(path) => confy::store_path(path, config.clone())?,
        None => confy::store(APP_NAME, CONFIG_NAME, config.clone())?,
    }
    Ok(())
}
