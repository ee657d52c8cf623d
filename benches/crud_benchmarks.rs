use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use offset_tree::{Avl, HugeList, KeyedMap, MultiRankMap, RangeMap, Splay};
use std::collections::BTreeMap;

const N: usize = 10_000;

// ─── Helper functions to generate key sequences ─────────────────────────────

fn ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).collect()
}

fn random_keys(n: usize) -> Vec<i64> {
    // Use a simple LCG for deterministic pseudo-random sequence
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

fn random_indices(n: usize) -> Vec<usize> {
    random_keys(n).into_iter().map(|k| k as usize).collect()
}

// ─── Keyed Map Benchmarks ───────────────────────────────────────────────────

fn bench_map_insert_ordered(c: &mut Criterion) {
    let keys = ordered_keys(N);
    let mut group = c.benchmark_group("map_insert_ordered");

    group.bench_function(BenchmarkId::new("KeyedMap<Avl>", N), |b| {
        b.iter(|| {
            let mut map: KeyedMap<i64, i64, Avl> = KeyedMap::new();
            for &k in &keys {
                map.insert(k, k);
            }
            map
        });
    });

    group.bench_function(BenchmarkId::new("KeyedMap<Splay>", N), |b| {
        b.iter(|| {
            let mut map: KeyedMap<i64, i64, Splay> = KeyedMap::new();
            for &k in &keys {
                map.insert(k, k);
            }
            map
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut map = BTreeMap::new();
            for &k in &keys {
                map.insert(k, k);
            }
            map
        });
    });

    group.finish();
}

fn bench_map_insert_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut group = c.benchmark_group("map_insert_random");

    group.bench_function(BenchmarkId::new("KeyedMap<Avl>", N), |b| {
        b.iter(|| {
            let mut map: KeyedMap<i64, i64, Avl> = KeyedMap::new();
            for &k in &keys {
                map.upsert(k, k);
            }
            map
        });
    });

    group.bench_function(BenchmarkId::new("KeyedMap<Splay>", N), |b| {
        b.iter(|| {
            let mut map: KeyedMap<i64, i64, Splay> = KeyedMap::new();
            for &k in &keys {
                map.upsert(k, k);
            }
            map
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut map = BTreeMap::new();
            for &k in &keys {
                map.insert(k, k);
            }
            map
        });
    });

    group.finish();
}

fn bench_map_get_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut avl_map: KeyedMap<i64, i64, Avl> = keys.iter().map(|&k| (k, k)).collect();
    let mut splay_map: KeyedMap<i64, i64, Splay> = keys.iter().map(|&k| (k, k)).collect();
    let bt_map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();

    let mut group = c.benchmark_group("map_get_random");

    group.bench_function(BenchmarkId::new("KeyedMap<Avl>", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for &k in &keys {
                if let Some(&v) = avl_map.get(&k) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.bench_function(BenchmarkId::new("KeyedMap<Splay>", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for &k in &keys {
                if let Some(&v) = splay_map.get(&k) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for &k in &keys {
                if let Some(&v) = bt_map.get(&k) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.finish();
}

fn bench_map_get_repeated(c: &mut Criterion) {
    // A small working set inside a large map, where splaying pays off.
    let keys = ordered_keys(N);
    let hot: Vec<i64> = random_keys(N).into_iter().map(|k| k % 16).collect();
    let mut avl_map: KeyedMap<i64, i64, Avl> = keys.iter().map(|&k| (k, k)).collect();
    let mut splay_map: KeyedMap<i64, i64, Splay> = keys.iter().map(|&k| (k, k)).collect();

    let mut group = c.benchmark_group("map_get_repeated");

    group.bench_function(BenchmarkId::new("KeyedMap<Avl>", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for &k in &hot {
                if let Some(&v) = avl_map.get(&k) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.bench_function(BenchmarkId::new("KeyedMap<Splay>", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for &k in &hot {
                if let Some(&v) = splay_map.get(&k) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.finish();
}

fn bench_map_remove_random(c: &mut Criterion) {
    let keys = random_keys(N);

    let mut group = c.benchmark_group("map_remove_random");

    group.bench_function(BenchmarkId::new("KeyedMap<Avl>", N), |b| {
        b.iter_batched(
            || keys.iter().map(|&k| (k, k)).collect::<KeyedMap<i64, i64, Avl>>(),
            |mut map| {
                for &k in &keys {
                    let _ = map.try_remove(&k);
                }
                map
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function(BenchmarkId::new("KeyedMap<Splay>", N), |b| {
        b.iter_batched(
            || keys.iter().map(|&k| (k, k)).collect::<KeyedMap<i64, i64, Splay>>(),
            |mut map| {
                for &k in &keys {
                    let _ = map.try_remove(&k);
                }
                map
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter_batched(
            || keys.iter().map(|&k| (k, k)).collect::<BTreeMap<i64, i64>>(),
            |mut map| {
                for &k in &keys {
                    map.remove(&k);
                }
                map
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ─── Rank Benchmarks ────────────────────────────────────────────────────────

fn bench_rank_lookup(c: &mut Criterion) {
    let keys = ordered_keys(N);
    let mut map: MultiRankMap<i64, (), Avl> = keys.iter().map(|&k| (k, (), (k as usize % 7) + 1)).collect();
    let total = map.extent();
    let ranks: Vec<usize> = random_indices(N).into_iter().map(|r| r % total).collect();

    let mut group = c.benchmark_group("rank_lookup");

    group.bench_function(BenchmarkId::new("MultiRankMap::get_by_rank", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for &rank in &ranks {
                if let Some((&k, _, _)) = map.get_by_rank(rank) {
                    sum = sum.wrapping_add(k);
                }
            }
            sum
        });
    });

    group.bench_function(BenchmarkId::new("MultiRankMap::rank_of", N), |b| {
        b.iter(|| {
            let mut sum = 0usize;
            for &k in &keys {
                if let Some(rank) = map.rank_of(&k) {
                    sum = sum.wrapping_add(rank);
                }
            }
            sum
        });
    });

    group.finish();
}

// ─── Range Benchmarks ───────────────────────────────────────────────────────

fn bench_range_probe(c: &mut Criterion) {
    let lengths: Vec<usize> = random_indices(N).into_iter().map(|l| l % 80 + 1).collect();
    let mut map: RangeMap<usize> = lengths.iter().enumerate().map(|(i, &l)| (l, i)).collect();
    let extent = map.extent();
    let probes: Vec<usize> = random_indices(N).into_iter().map(|p| p % extent).collect();

    let mut group = c.benchmark_group("range_probe");

    group.bench_function(BenchmarkId::new("RangeMap::get_range", N), |b| {
        b.iter(|| {
            let mut sum = 0usize;
            for &position in &probes {
                if let Some((start, _, _)) = map.get_range(position) {
                    sum = sum.wrapping_add(start);
                }
            }
            sum
        });
    });

    group.finish();
}

fn bench_range_adjust(c: &mut Criterion) {
    let lengths: Vec<usize> = random_indices(N).into_iter().map(|l| l % 80 + 1).collect();
    let template: RangeMap<usize> = lengths.iter().enumerate().map(|(i, &l)| (l, i)).collect();
    let starts: Vec<usize> = template.iter().map(|(start, _, _)| start).collect();

    let mut group = c.benchmark_group("range_adjust");

    group.bench_function(BenchmarkId::new("RangeMap::adjust_length", N), |b| {
        b.iter_batched(
            || lengths.iter().enumerate().map(|(i, &l)| (l, i)).collect::<RangeMap<usize>>(),
            |mut map| {
                // Back to front, so earlier starts stay valid.
                for &start in starts.iter().rev() {
                    map.adjust_length(start, 1);
                }
                map
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

// ─── List Benchmarks ────────────────────────────────────────────────────────

fn bench_list_insert_middle(c: &mut Criterion) {
    let positions = random_indices(N);

    let mut group = c.benchmark_group("list_insert_middle");

    group.bench_function(BenchmarkId::new("HugeList", N), |b| {
        b.iter(|| {
            let mut list: HugeList<i64> = HugeList::new();
            for (i, &p) in positions.iter().enumerate() {
                list.insert(p % (i + 1), i as i64);
            }
            list
        });
    });

    group.bench_function(BenchmarkId::new("Vec", N), |b| {
        b.iter(|| {
            let mut list: Vec<i64> = Vec::new();
            for (i, &p) in positions.iter().enumerate() {
                list.insert(p % (i + 1), i as i64);
            }
            list
        });
    });

    group.finish();
}

fn bench_list_remove_middle(c: &mut Criterion) {
    let positions = random_indices(N);

    let mut group = c.benchmark_group("list_remove_middle");

    group.bench_function(BenchmarkId::new("HugeList", N), |b| {
        b.iter_batched(
            || (0..N as i64).collect::<HugeList<i64>>(),
            |mut list| {
                for (i, &p) in positions.iter().enumerate() {
                    list.remove_at(p % (N - i));
                }
                list
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function(BenchmarkId::new("Vec", N), |b| {
        b.iter_batched(
            || (0..N as i64).collect::<Vec<i64>>(),
            |mut list| {
                for (i, &p) in positions.iter().enumerate() {
                    list.remove(p % (N - i));
                }
                list
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_list_get_random(c: &mut Criterion) {
    let positions: Vec<usize> = random_indices(N).into_iter().map(|p| p % N).collect();
    let mut list: HugeList<i64> = (0..N as i64).collect();

    let mut group = c.benchmark_group("list_get_random");

    group.bench_function(BenchmarkId::new("HugeList", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for &p in &positions {
                if let Some(&v) = list.get(p) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.finish();
}

// ─── Criterion Groups ───────────────────────────────────────────────────────

criterion_group!(
    map_benches,
    bench_map_insert_ordered,
    bench_map_insert_random,
    bench_map_get_random,
    bench_map_get_repeated,
    bench_map_remove_random,
);

criterion_group!(rank_benches, bench_rank_lookup);

criterion_group!(range_benches, bench_range_probe, bench_range_adjust);

criterion_group!(list_benches, bench_list_insert_middle, bench_list_remove_middle, bench_list_get_random);

criterion_main!(map_benches, rank_benches, range_benches, list_benches);
