//! Reconciliation benchmarks against the in-memory store.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use tabimport_bench::people;
use tabimport_engine::{ImportInstructions, ImportItem, Reconciler};
use tabimport_testkit::{person_store, seeded_store, Person};

fn items(people: Vec<Person>, instructions: ImportInstructions) -> Vec<ImportItem<usize, Person>> {
    people
        .into_iter()
        .enumerate()
        .map(|(row, person)| ImportItem::new(row + 1, person, instructions))
        .collect()
}

/// Benchmark inserting rows into an empty store.
fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_insert");
    let insert = ImportInstructions::new().with_insert(true);

    for count in [100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            b.iter_batched(
                || (Reconciler::new(person_store()), items(people(count, false), insert)),
                |(reconciler, mut items)| {
                    for item in &mut items {
                        black_box(reconciler.reconcile(item).unwrap());
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Benchmark a pass where every row matches its stored record.
fn bench_unchanged(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_unchanged");
    let all = ImportInstructions::new()
        .with_insert(true)
        .with_update(true)
        .with_merge(true);

    for count in [100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let reconciler = Reconciler::new(seeded_store(people(count, true)));
            let mut items = items(people(count, true), all);

            b.iter(|| {
                for item in &mut items {
                    black_box(reconciler.reconcile(item).unwrap());
                }
            });
        });
    }
    group.finish();
}

/// Benchmark merging a changed field into every stored record.
fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_merge");
    let merge = ImportInstructions::new().with_merge(true);

    for count in [100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let renamed: Vec<_> = people(count, true)
                .into_iter()
                .map(|mut p| {
                    p.name = p.name.map(|n| n.to_uppercase());
                    p
                })
                .collect();

            b.iter_batched(
                || {
                    let store = seeded_store(people(count, true));
                    (Reconciler::new(store), items(renamed.clone(), merge))
                },
                |(reconciler, mut items)| {
                    for item in &mut items {
                        black_box(reconciler.reconcile(item).unwrap());
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_unchanged, bench_merge);
criterion_main!(benches);
