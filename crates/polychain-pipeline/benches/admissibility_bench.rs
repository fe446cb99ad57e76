//! Criterion benchmarks for the two admissibility strategies.
//! Chain sizes: n in {10, 25, 50, 100}.
//! Results land under target/criterion.

#![allow(clippy::unwrap_used)]

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use polychain_pipeline::{AdmissibilityKind, ChainState, Point, SimplifyConfig};

/// A deterministic wandering chain that stays inside `[0, 100]²`.
#[allow(clippy::cast_precision_loss)]
fn wandering_chain(n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            let x = 100.0 * t / n as f64;
            let y = 50.0 + 20.0 * (t * 0.37).sin() + 7.0 * (t * 1.91).cos();
            Point::new(x, y)
        })
        .collect()
}

fn bench_admissibility(c: &mut Criterion) {
    let mut group = c.benchmark_group("admissibility");
    for &n in &[10usize, 25, 50, 100] {
        let points = wandering_chain(n);
        for strategy in [AdmissibilityKind::IriImai, AdmissibilityKind::Cone] {
            let config = SimplifyConfig {
                epsilon: 5.0,
                strategy,
                ..SimplifyConfig::default()
            };
            group.bench_with_input(BenchmarkId::new(strategy.label(), n), &n, |b, _| {
                b.iter_batched(
                    || ChainState::build_chain(&points, &config).unwrap(),
                    |mut chain| {
                        let _report = chain.run(strategy).unwrap();
                    },
                    BatchSize::SmallInput,
                );
            });
        }
    }
    group.finish();
}

fn bench_simplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("simplify");
    for &n in &[10usize, 50, 100] {
        let points = wandering_chain(n);
        let config = SimplifyConfig {
            epsilon: 5.0,
            ..SimplifyConfig::default()
        };
        group.bench_with_input(BenchmarkId::new("iri-imai", n), &n, |b, _| {
            b.iter(|| polychain_pipeline::simplify(&points, &config).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_admissibility, bench_simplify);
criterion_main!(benches);
