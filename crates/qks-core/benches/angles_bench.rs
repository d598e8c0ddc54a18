//! Benchmarks for episode generation and angle mapping
//!
//! Run with: cargo bench -p qks-core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array2;
use qks_core::{AngleMapper, Ansatz, BlockLayout, generate};

/// Benchmark parameter generation
fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for num_episodes in &[10, 100, 1000, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("dim_2", num_episodes),
            num_episodes,
            |b, &e| {
                b.iter(|| generate(black_box(2), black_box(e), Some(7)).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark one θ computation
fn bench_angles(c: &mut Criterion) {
    let mut group = c.benchmark_group("angles");

    for dim in &[2, 8, 32, 128] {
        let data = Array2::from_shape_fn((16, *dim), |(i, j)| (i * j) as f64 * 0.01);
        let params = generate(*dim, 64, Some(11)).unwrap();

        let diagonal = BlockLayout::diagonal(*dim).unwrap();
        let mapper = AngleMapper::new(data.view(), &params, diagonal).unwrap();
        group.bench_with_input(BenchmarkId::new("diagonal", dim), dim, |b, _| {
            b.iter(|| mapper.angles(black_box(5), black_box(31)).unwrap());
        });

        let blocked = BlockLayout::new(*dim, 2).unwrap();
        let mapper = AngleMapper::new(data.view(), &params, blocked).unwrap();
        group.bench_with_input(BenchmarkId::new("two_blocks", dim), dim, |b, _| {
            b.iter(|| mapper.angles(black_box(5), black_box(31)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark template construction and binding
fn bench_template(c: &mut Criterion) {
    let mut group = c.benchmark_group("template");

    for num_qubits in &[2, 8, 32] {
        let ansatz = Ansatz::for_inputs(*num_qubits).unwrap();
        let theta = ndarray::Array1::linspace(0.0, 1.0, *num_qubits);

        group.bench_with_input(
            BenchmarkId::new("build", num_qubits),
            num_qubits,
            |b, _| {
                b.iter(|| black_box(&ansatz).template());
            },
        );
        group.bench_with_input(
            BenchmarkId::new("bind", num_qubits),
            num_qubits,
            |b, _| {
                b.iter(|| ansatz.bind(black_box(theta.view())).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_generate, bench_angles, bench_template);
criterion_main!(benches);
