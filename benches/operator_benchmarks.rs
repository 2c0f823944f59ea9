//! Operator throughput benchmarks: restriction, union dedup, and
//! symmetric hash join over generated relations.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use relstream::predicate::field;
use relstream::{CandidateKeys, DataType, Heading, Relation, Tuple};

fn keyed_pairs(name: &str, n: i64, groups: i64) -> Relation {
    Relation::new_distinct(
        Heading::new([("K", DataType::Int64), (name, DataType::Int64)]).unwrap(),
        (0..n).map(|i| Tuple::from([i % groups, i])).collect(),
        CandidateKeys::new([vec!["K", name]]),
    )
}

fn bench_restrict(c: &mut Criterion) {
    let mut group = c.benchmark_group("restrict");
    for size in [1_000i64, 10_000, 100_000] {
        let rel = keyed_pairs("A", size, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let filtered = rel.restrict(field("A").lt(size / 2));
                filtered.cardinality().unwrap()
            });
        });
    }
    group.finish();
}

fn bench_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("union_overlapping_halves");
    for size in [1_000i64, 10_000] {
        let left = keyed_pairs("A", size, size);
        let right = keyed_pairs("A", size / 2, size / 2);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| left.union(&right).cardinality().unwrap());
        });
    }
    group.finish();
}

fn bench_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("symmetric_hash_join");
    for size in [1_000i64, 10_000] {
        let left = keyed_pairs("A", size, size / 10);
        let right = keyed_pairs("B", size, size / 10);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| left.natural_join(&right).cardinality().unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_restrict, bench_union, bench_join);
criterion_main!(benches);
