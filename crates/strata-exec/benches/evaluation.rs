//! Performance benchmarks for strata-exec
//!
//! Run with: cargo bench -p strata-exec
//!
//! Benchmarks cover:
//! - Element-wise assignment over matching and mismatched storage orders
//! - Products assigned directly versus through `update`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use strata_core::{DenseMatrix, StorageOrder};
use strata_exec::{Assign, Lazy};

fn dense(n: usize, seed: usize, order: StorageOrder) -> DenseMatrix<f64> {
    DenseMatrix::from_fn_with_order(n, n, order, |i, j| ((i * 7 + j * 13 + seed) % 17) as f64 - 8.0)
}

fn bench_elementwise(c: &mut Criterion) {
    let mut group = c.benchmark_group("elementwise");

    for &size in [64, 256, 512].iter() {
        let a = dense(size, 1, StorageOrder::RowMajor);
        let b = dense(size, 2, StorageOrder::RowMajor);
        group.throughput(Throughput::Elements((size * size) as u64));

        for (name, order) in [("runs", StorageOrder::RowMajor), ("per_element", StorageOrder::ColumnMajor)] {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |bencher, _| {
                let mut out = DenseMatrix::<f64>::zeros_with_order(size, size, order);
                bencher.iter(|| {
                    out.assign(a.lazy() + &b - b.lazy() * 0.5f64).unwrap();
                    black_box(&out);
                });
            });
        }
    }
    group.finish();
}

fn bench_products(c: &mut Criterion) {
    let mut group = c.benchmark_group("assigned_product");

    for &size in [32, 128].iter() {
        let a = dense(size, 3, StorageOrder::RowMajor);
        let b = dense(size, 4, StorageOrder::RowMajor);
        group.throughput(Throughput::Elements((size * size * size) as u64));

        group.bench_with_input(BenchmarkId::new("direct", size), &size, |bencher, _| {
            let mut out = DenseMatrix::<f64>::zeros(size, size);
            bencher.iter(|| {
                out.assign(a.lazy() * &b).unwrap();
                black_box(&out);
            });
        });

        group.bench_with_input(BenchmarkId::new("update", size), &size, |bencher, _| {
            let mut out = a.clone();
            bencher.iter(|| {
                out.update(|x| x * &b * 0.0f64).unwrap();
                black_box(&out);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_elementwise, bench_products);
criterion_main!(benches);
