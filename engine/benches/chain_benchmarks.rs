use chain_engine::cache::Cache;
use chain_engine::config::NodeConfig;
use chain_engine::executor::precompiles::StandardPrecompiles;
use chain_engine::store::memory::MemoryStore;
use chain_engine::trie;
use chain_engine::types::{Address, Block, Hash};
use chain_engine::vrf;
use chain_engine::{chain, hash};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Performance benchmarks for the chain engine's hot paths: block
/// admission, stability advancement and receipts-root computation.

fn witness_config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.witness_count = 1;
    config.genesis_witness_list = vec![Address::from_low_u64_be(100)];
    config
}

fn child_block(from: Address, previous: Hash, parent: Hash, anchor: Hash) -> Block {
    Block {
        hash: hash::keccak256(format!("{from:?}{parent:?}{previous:?}").as_bytes()),
        previous,
        parents: vec![parent],
        links: vec![],
        approves: vec![],
        last_summary_block: anchor,
        last_stable_block: anchor,
        from,
        exec_timestamp: 0,
    }
}

fn bench_genesis_bootstrap(c: &mut Criterion) {
    c.bench_function("genesis_bootstrap", |b| {
        b.iter(|| {
            let mut store = MemoryStore::new();
            let mut cache = Cache::new(&mut store);
            let config = NodeConfig::default();
            black_box(chain::init(&mut cache, &config).unwrap());
        });
    });
}

fn bench_ingest_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest_block");
    let chain_lengths = vec![10usize, 50, 200];

    for len in chain_lengths {
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("linear_chain", len), &len, |b, &len| {
            b.iter(|| {
                let mut store = MemoryStore::new();
                let mut cache = Cache::new(&mut store);
                let config = witness_config();
                let genesis_hash = chain::init(&mut cache, &config).unwrap();

                let witness = Address::from_low_u64_be(100);
                let mut previous = Hash::zero();
                let mut parent = genesis_hash;
                for _ in 0..len {
                    let block = child_block(witness, previous, parent, genesis_hash);
                    chain::ingest_block(&mut cache, block.clone()).unwrap();
                    previous = block.hash;
                    parent = block.hash;
                }
            });
        });
    }
    group.finish();
}

fn bench_try_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("try_advance");
    let chain_lengths = vec![10usize, 50, 200];

    for len in chain_lengths {
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("linear_chain", len), &len, |b, &len| {
            b.iter(|| {
                let mut store = MemoryStore::new();
                let mut cache = Cache::new(&mut store);
                let config = witness_config();
                let genesis_hash = chain::init(&mut cache, &config).unwrap();

                let witness = Address::from_low_u64_be(100);
                let mut previous = Hash::zero();
                let mut parent = genesis_hash;
                for _ in 0..len {
                    let block = child_block(witness, previous, parent, genesis_hash);
                    chain::ingest_block(&mut cache, block.clone()).unwrap();
                    previous = block.hash;
                    parent = block.hash;
                }

                let precompiles = StandardPrecompiles::new(config.precompile_gas.clone());
                black_box(chain::try_advance(&mut cache, &config, &precompiles).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_receipts_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("receipts_root");
    let counts = vec![1usize, 16, 256];

    for count in counts {
        let rlps: Vec<Vec<u8>> = (0..count).map(|i| format!("receipt-{i}").into_bytes()).collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("ordered_trie_root", count), &rlps, |b, rlps| {
            b.iter(|| black_box(trie::ordered_trie_root(rlps.clone())));
        });
    }
    group.finish();
}

fn bench_vrf_derive_output(c: &mut Criterion) {
    let seed = hash::keccak256(b"epoch-seed");
    let signature = vec![7u8; 64];
    c.bench_function("vrf_derive_output", |b| {
        b.iter(|| black_box(vrf::derive_output(seed, black_box(&signature))));
    });
}

criterion_group!(
    chain_benches,
    bench_genesis_bootstrap,
    bench_ingest_chain,
    bench_try_advance,
    bench_receipts_root,
    bench_vrf_derive_output,
);
criterion_main!(chain_benches);
