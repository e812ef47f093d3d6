use batchpoints_sdk::{extract, FilterSpec, MeasurementTree, NodeKind, Reading};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const OWNER: &str = "urn:mrn:signalk:uuid:bench";

/// A tree with `groups` top-level groups of ten measurements each; every
/// fifth measurement is a two-source position.
fn build_tree(groups: usize) -> MeasurementTree {
    let mut tree = MeasurementTree::new();
    for g in 0..groups {
        for m in 0..10 {
            let path = format!("group{}.sub.measurement{}", g, m);
            let kind = if m % 5 == 0 {
                NodeKind::multi_source([
                    ("gps-1", Reading::composite([("longitude", -122.4), ("latitude", 47.67)])),
                    ("gps-2", Reading::composite([("longitude", -122.5), ("latitude", 47.68)])),
                ])
            } else {
                NodeKind::simple("bench", m as f64)
            };
            tree.insert(OWNER, &path, kind);
        }
    }
    tree
}

/// Benchmark extraction with every path selected
fn bench_extract_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_all");
    let filter = FilterSpec::all();

    for groups in [1usize, 10, 100].iter() {
        let tree = build_tree(*groups);
        group.bench_with_input(BenchmarkId::from_parameter(groups), groups, |b, _| {
            b.iter(|| black_box(extract(&tree, OWNER, &filter).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark extraction through a glob include list
fn bench_extract_filtered(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_filtered");
    let filter = FilterSpec::include(["group1.*", "group7.sub.*", "group42.sub.measurement3"]);

    for groups in [10usize, 100].iter() {
        let tree = build_tree(*groups);
        group.bench_with_input(BenchmarkId::from_parameter(groups), groups, |b, _| {
            b.iter(|| black_box(extract(&tree, OWNER, &filter).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract_all, bench_extract_filtered);
criterion_main!(benches);
