//! Micro-operation benchmarks for the two-tier cache and its scored list.
//!
//! Run with: `cargo bench --bench bicache`

use std::hint::black_box;
use std::time::Instant;

use bicache::config::BicacheConfig;
use bicache::ds::ScoredList;
use bicache::policy::bicache::BicacheCore;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MFU: usize = 4_096;
const MRU: usize = 12_288;
const OPS: u64 = 100_000;

fn core(auto_evict_ms: u64) -> BicacheCore<u64, u64> {
    BicacheCore::with_config(&BicacheConfig {
        mfu_size: MFU,
        mru_size: MRU,
        auto_evict_ms,
    })
    .unwrap()
}

// ============================================================================
// Scored List
// ============================================================================

fn bench_scored_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("scored_list");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("push_tail_remove_head", |b| {
        b.iter_custom(|iters| {
            let mut list = ScoredList::with_capacity(1024);
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    list.push_tail(i);
                    if list.len() > 1024 {
                        black_box(list.remove_head());
                    }
                }
            }
            start.elapsed()
        })
    });

    for n in [1usize, 16, 256] {
        group.bench_with_input(BenchmarkId::new("high_scores", n), &n, |b, &n| {
            let mut list = ScoredList::with_capacity(MRU);
            let handles: Vec<_> = (0..MRU as u64).map(|i| list.push_tail(i)).collect();
            let mut rng = StdRng::seed_from_u64(7);
            for _ in 0..MRU * 4 {
                list.read(handles[rng.gen_range(0..handles.len())]);
            }
            b.iter(|| black_box(list.high_scores(n)))
        });
    }

    group.finish();
}

// ============================================================================
// Cache Operations
// ============================================================================

fn bench_cache_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("bicache_ns");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("get_hit", |b| {
        b.iter_custom(|iters| {
            let mut cache = core(0);
            for i in 0..MRU as u64 {
                cache.set(i, i);
            }
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    black_box(cache.get(&(i % MRU as u64)));
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("set_inline_evict", |b| {
        b.iter_custom(|iters| {
            let mut cache = core(0);
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    black_box(cache.set(i, i));
                }
            }
            start.elapsed()
        })
    });

    group.bench_function("set_deferred_evict", |b| {
        b.iter_custom(|iters| {
            let mut cache = core(1_000);
            let start = Instant::now();
            for _ in 0..iters {
                for i in 0..OPS {
                    cache.set(i, i);
                    if i % 1_024 == 0 {
                        black_box(cache.promote_evict());
                    }
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

// ============================================================================
// Skewed Workload
// ============================================================================

fn bench_skewed(c: &mut Criterion) {
    let mut group = c.benchmark_group("bicache_skewed");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function("hot_10pct", |b| {
        b.iter_custom(|iters| {
            let mut cache = core(0);
            let mut rng = StdRng::seed_from_u64(42);
            let universe = (MFU + MRU) as u64 * 4;
            let hot = universe / 10;
            let start = Instant::now();
            for _ in 0..iters {
                for _ in 0..OPS {
                    let key = if rng.gen_bool(0.8) {
                        rng.gen_range(0..hot)
                    } else {
                        rng.gen_range(0..universe)
                    };
                    if cache.get(&key).is_none() {
                        cache.set(key, key);
                    }
                }
            }
            start.elapsed()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_scored_list, bench_cache_ops, bench_skewed);
criterion_main!(benches);
