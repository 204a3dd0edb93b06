use anyhow::Result;
use chain_engine::cache::Cache;
use chain_engine::chain;
use chain_engine::executor::precompiles::StandardPrecompiles;
use chain_engine::store::memory::MemoryStore;
use clap::{Parser, Subcommand};
use log::info;
use node_cli::{config, trace};

#[derive(Debug, Parser)]
#[command(version, author, about = "Operator CLI for the chain engine")]
struct Args {
    /// Configuration file path. Falls back to the platform config
    /// directory (via `confy`) when omitted.
    #[clap(short = 'c', long = "config")]
    config: Option<String>,

    #[clap(short = 'l', long, default_value = "info")]
    log_level: String,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Bootstraps genesis and prints the resulting genesis hash.
    Init,
    /// Prints the current frontier: last MCI, last stable MCI and the
    /// minimum retrievable MCI.
    Status,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_dir = format!("{}/.node-cli", std::env::var("HOME").unwrap_or_else(|_| ".".to_string()));
    let _guard = trace::init_logging(&log_dir, &args.log_level)?;

    let config = config::load(args.config.as_deref())?;
    info!("loaded config: {:?}", &config);

    let mut store = MemoryStore::new();
    let mut cache = Cache::new(&mut store);

    match args.cmd {
        Command::Init => {
            let genesis_hash = chain::init(&mut cache, &config)?;
            info!("bootstrapped genesis {genesis_hash:#x}");
            println!("genesis hash: {genesis_hash:#x}");
        }
        Command::Status => {
            let genesis_hash = chain::init(&mut cache, &config)?;
            let precompiles = StandardPrecompiles::new(config.precompile_gas.clone());
            chain::try_advance(&mut cache, &config, &precompiles)?;
            print_status(&mut cache, genesis_hash)?;
        }
    }

    Ok(())
}

fn print_status(
    cache: &mut Cache<'_, MemoryStore>,
    genesis_hash: chain_engine::types::Hash,
) -> Result<()> {
    use chain_engine::store::ColumnFamily;
    use colored::Colorize;

    let last_mci: u64 = cache.get(ColumnFamily::Metadata, b"last_mci")?.unwrap_or(0);
    let last_stable_mci: u64 = cache.get(ColumnFamily::Metadata, b"last_stable_mci")?.unwrap_or(0);
    let min_retrievable_mci: u64 = cache.get(ColumnFamily::Metadata, b"min_retrievable_mci")?.unwrap_or(0);

    println!("{}", "chain status".bold());
    println!("  genesis hash:        {genesis_hash:#x}");
    println!("  last mci:            {last_mci}");
    println!("  last stable mci:     {last_stable_mci}");
    println!("  min retrievable mci: {min_retrievable_mci}");

    Ok(())
}
