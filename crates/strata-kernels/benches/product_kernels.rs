//! Performance benchmarks for strata-kernels
//!
//! Run with: cargo bench -p strata-kernels
//!
//! Benchmarks cover:
//! - Dense products (naive, blocked, parallel)
//! - Transposed-operand products
//! - Sparse × dense and sparse × sparse products

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use strata_core::{DenseMatrix, StorageOrder};
use strata_kernels::*;
use strata_sparse::CsrMatrix;

fn dense(n: usize, seed: usize) -> DenseMatrix<f64> {
    DenseMatrix::from_fn(n, n, |i, j| ((i * 7 + j * 13 + seed) % 17) as f64 - 8.0)
}

fn banded(n: usize) -> CsrMatrix<f64> {
    let mut triplets = Vec::new();
    for i in 0..n {
        for j in i.saturating_sub(2)..(i + 3).min(n) {
            triplets.push((i, j, (i + j) as f64 + 1.0));
        }
    }
    CsrMatrix::from_triplets((n, n), &triplets).unwrap()
}

fn bench_dense_gemm(c: &mut Criterion) {
    let mut group = c.benchmark_group("gemm");

    for &size in [16, 64, 128, 256].iter() {
        let a = dense(size, 1);
        let b = dense(size, 2);
        group.throughput(Throughput::Elements((size * size * size) as u64));

        group.bench_with_input(BenchmarkId::new("naive", size), &size, |bencher, _| {
            let mut out = DenseMatrix::zeros(size, size);
            bencher.iter(|| {
                gemm_naive(
                    &GemmOperand::from_dense(&a),
                    &GemmOperand::from_dense(&b),
                    &mut GemmOutput::from_dense(&mut out),
                )
                .unwrap();
                black_box(&out);
            });
        });

        for &block in [32, 64].iter() {
            group.bench_with_input(
                BenchmarkId::new(format!("blocked_{}", block), size),
                &size,
                |bencher, _| {
                    let mut out = DenseMatrix::zeros(size, size);
                    bencher.iter(|| {
                        gemm_blocked(
                            &GemmOperand::from_dense(&a),
                            &GemmOperand::from_dense(&b),
                            &mut GemmOutput::from_dense(&mut out),
                            block,
                        )
                        .unwrap();
                        black_box(&out);
                    });
                },
            );
        }

        #[cfg(feature = "parallel")]
        group.bench_with_input(BenchmarkId::new("parallel", size), &size, |bencher, _| {
            let mut out = DenseMatrix::zeros(size, size);
            bencher.iter(|| {
                gemm_parallel(
                    &GemmOperand::from_dense(&a),
                    &GemmOperand::from_dense(&b),
                    &mut GemmOutput::from_dense(&mut out),
                )
                .unwrap();
                black_box(&out);
            });
        });
    }
    group.finish();
}

fn bench_transposed_gemm(c: &mut Criterion) {
    let mut group = c.benchmark_group("gemm_transposed");

    for &size in [64, 128].iter() {
        let a = dense(size, 3);
        let b = dense(size, 4).to_order(StorageOrder::ColumnMajor);
        group.bench_with_input(BenchmarkId::new("a_t_b", size), &size, |bencher, _| {
            let mut out = DenseMatrix::zeros(size, size);
            bencher.iter(|| {
                gemm_blocked(
                    &GemmOperand::from_dense(&a).transposed(),
                    &GemmOperand::from_dense(&b),
                    &mut GemmOutput::from_dense(&mut out),
                    64,
                )
                .unwrap();
                black_box(&out);
            });
        });
    }
    group.finish();
}

fn bench_sparse(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_products");

    for &size in [100, 400, 1000].iter() {
        let a = banded(size);
        let b = dense(size, 5);
        group.bench_with_input(BenchmarkId::new("spmm", size), &size, |bencher, _| {
            let mut out = DenseMatrix::zeros(size, size);
            bencher.iter(|| {
                spmm(
                    &a,
                    &GemmOperand::from_dense(&b),
                    &mut GemmOutput::from_dense(&mut out),
                )
                .unwrap();
                black_box(&out);
            });
        });

        group.bench_with_input(BenchmarkId::new("spgemm", size), &size, |bencher, _| {
            bencher.iter(|| black_box(spgemm_sorted_merge(&a, &a).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_dense_gemm, bench_transposed_gemm, bench_sparse);
criterion_main!(benches);
