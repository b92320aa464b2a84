//! Contract benchmarks.
//!
//! Measures each contract operation for every registered backend, so the
//! direct engine can be compared against the alternatives call for call.

use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ormbench_bench::fixtures::{batch, generate_random_users};
use ormbench_bench::{BackendKind, Provisioner, StorageMode, Target};
use ormbench_core::{Orm, User};

const PRELOAD: usize = 1000;

/// A backend with schema on its own target.
struct Bench {
    orm: Box<dyn Orm>,
    _target: Target,
}

impl Bench {
    fn new(kind: BackendKind) -> Self {
        let target = Provisioner::new(StorageMode::SharedMemory)
            .provision(kind)
            .unwrap();
        let mut orm = kind.create().unwrap();
        orm.init(target.dsn()).unwrap();
        orm.create_schema().unwrap();
        Self {
            orm,
            _target: target,
        }
    }

    fn with_users(kind: BackendKind, count: usize) -> (Self, Vec<i64>) {
        let mut bench = Self::new(kind);
        let mut users = generate_random_users(count);
        for chunk in users.chunks_mut(100) {
            bench.orm.insert_batch(chunk).unwrap();
        }
        let ids = users.iter().map(|u| u.id).collect();
        (bench, ids)
    }
}

fn bench_insert_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("contract/insert_single");

    for &kind in BackendKind::ALL {
        let mut bench = Bench::new(kind);
        group.bench_function(kind.name(), |b| {
            b.iter(|| {
                let mut user = User::new("bench", "bench@example.com", 30);
                bench.orm.insert(&mut user).unwrap();
                black_box(user.id);
            });
        });
    }

    group.finish();
}

fn bench_insert_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("contract/insert_batch");

    for &kind in BackendKind::ALL {
        for size in [10, 100] {
            let mut bench = Bench::new(kind);
            let mut round = 0;
            group.bench_with_input(BenchmarkId::new(kind.name(), size), &size, |b, &size| {
                b.iter(|| {
                    let mut users = batch(round, size);
                    round += 1;
                    bench.orm.insert_batch(&mut users).unwrap();
                    black_box(users[0].id);
                });
            });
        }
    }

    group.finish();
}

fn bench_get_by_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("contract/get_by_id");

    for &kind in BackendKind::ALL {
        let (mut bench, ids) = Bench::with_users(kind, PRELOAD);
        let mut i = 0;
        group.bench_function(kind.name(), |b| {
            b.iter(|| {
                let user = bench.orm.get_by_id(ids[i % ids.len()]).unwrap();
                i += 1;
                black_box(user);
            });
        });
    }

    group.finish();
}

fn bench_get_by_ids(c: &mut Criterion) {
    let mut group = c.benchmark_group("contract/get_by_ids");

    for &kind in BackendKind::ALL {
        let (mut bench, ids) = Bench::with_users(kind, PRELOAD);
        for size in [10, 100] {
            group.bench_with_input(BenchmarkId::new(kind.name(), size), &size, |b, &size| {
                b.iter(|| {
                    let users = bench.orm.get_by_ids(&ids[..size]).unwrap();
                    black_box(users.len());
                });
            });
        }
    }

    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("contract/update");

    for &kind in BackendKind::ALL {
        let (mut bench, ids) = Bench::with_users(kind, PRELOAD);
        let mut i = 0;
        group.bench_function(kind.name(), |b| {
            b.iter(|| {
                let mut user = User::new(format!("updated_user{}", i), "u@example.com", 30);
                user.id = ids[i % ids.len()];
                i += 1;
                bench.orm.update(&user).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let mut group = c.benchmark_group("contract/delete");

    for &kind in BackendKind::ALL {
        let mut bench = Bench::new(kind);
        group.bench_function(kind.name(), |b| {
            // Rows are inserted untimed, one per measured delete.
            b.iter_custom(|iters| {
                let mut users = generate_random_users(iters as usize);
                for chunk in users.chunks_mut(100) {
                    bench.orm.insert_batch(chunk).unwrap();
                }

                let mut elapsed = Duration::ZERO;
                for user in &users {
                    let start = Instant::now();
                    bench.orm.delete(user.id).unwrap();
                    elapsed += start.elapsed();
                }
                elapsed
            });
        });
    }

    group.finish();
}

fn bench_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("contract/count");

    for &kind in BackendKind::ALL {
        let (mut bench, _) = Bench::with_users(kind, PRELOAD);
        group.bench_function(kind.name(), |b| {
            b.iter(|| black_box(bench.orm.count().unwrap()));
        });
    }

    group.finish();
}

fn bench_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("contract/list");

    for &kind in BackendKind::ALL {
        let (mut bench, _) = Bench::with_users(kind, PRELOAD);
        for limit in [10, 100] {
            group.bench_with_input(BenchmarkId::new(kind.name(), limit), &limit, |b, &limit| {
                b.iter(|| {
                    let users = bench.orm.list(limit, PRELOAD / 2).unwrap();
                    black_box(users.len());
                });
            });
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert_single,
    bench_insert_batch,
    bench_get_by_id,
    bench_get_by_ids,
    bench_update,
    bench_delete,
    bench_count,
    bench_list
);

criterion_main!(benches);
