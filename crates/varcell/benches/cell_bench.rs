//! Benchmarks for cell update paths.
//!
//! The memo hit (unchanged snapshot) is the hot path: an owner typically
//! refreshes far more often than its model changes.
//!
//! Run with: cargo bench -p varcell --bench cell_bench

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use varcell::{ValueCell, WorkValueCell};

fn payload(len: usize, seed: u64) -> Vec<u64> {
    (0..len as u64).map(|i| i.wrapping_mul(31) ^ seed).collect()
}

// =============================================================================
// Source path
// =============================================================================

fn bench_source_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("cell/source");

    for len in [16usize, 1024] {
        let model = payload(len, 7);

        group.bench_with_input(BenchmarkId::new("unchanged", len), &model, |b, model| {
            let mut cell = ValueCell::new(0u64);
            cell.apply_source_change(|| model.clone(), |v| v.iter().sum());
            b.iter(|| {
                black_box(cell.apply_source_change(|| model.clone(), |v| v.iter().sum()))
            })
        });

        let other = payload(len, 9);
        group.bench_with_input(
            BenchmarkId::new("changed", len),
            &(model, other),
            |b, (model, other)| {
                let mut cell = ValueCell::new(0u64);
                let mut flip = false;
                b.iter(|| {
                    flip = !flip;
                    let next = if flip { model } else { other };
                    black_box(cell.apply_source_change(|| next.clone(), |v| v.iter().sum()))
                })
            },
        );
    }

    group.finish();
}

// =============================================================================
// Work path
// =============================================================================

fn bench_work_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("cell/work");

    let draft = payload(256, 3);
    group.bench_function("unchanged", |b| {
        let mut cell: WorkValueCell<(), Vec<u64>> = WorkValueCell::mirrored(Vec::new());
        cell.apply_work_change(|| draft.clone());
        b.iter(|| black_box(cell.apply_work_change(|| draft.clone())))
    });

    group.bench_function("changed", |b| {
        let mut cell: WorkValueCell<(), Vec<u64>> = WorkValueCell::mirrored(Vec::new());
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            black_box(cell.apply_work_change(|| vec![n; 256]))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_source_path, bench_work_path);
criterion_main!(benches);
