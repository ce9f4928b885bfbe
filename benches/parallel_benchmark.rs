use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use entangle_sim::quantum::EprPair;
use entangle_sim::rng::SimRng;
use rayon::prelude::*;
use std::hint::black_box;

fn elementary(id: &str, fidelity: f64) -> EprPair {
    EprPair::new_elementary(id, "A".into(), "B".into(), fidelity, 0.0, 10.0)
}

fn benchmark_parallel_swapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parallel Operations");

    for size in [100, 1_000, 10_000].iter() {
        let a = elementary("a", 0.95);
        let b = elementary("b", 0.9);

        // Sequential
        group.bench_with_input(BenchmarkId::new("Sequential", size), size, |bench, &size| {
            bench.iter(|| {
                let mut rng = SimRng::from_seed(7);
                let results: Vec<Option<EprPair>> = (0..size).map(|_| a.swapping(&b, 1.0, &mut rng)).collect();
                black_box(results);
            });
        });

        // Parallel: each item seeds its own RNG so the independent swap
        // trials don't serialize on a shared one.
        group.bench_with_input(BenchmarkId::new("Parallel", size), size, |bench, &size| {
            bench.iter(|| {
                let results: Vec<Option<EprPair>> = (0..size)
                    .into_par_iter()
                    .map(|i| {
                        let mut rng = SimRng::from_seed(i as u64);
                        a.swapping(&b, 1.0, &mut rng)
                    })
                    .collect();
                black_box(results);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parallel_swapping);
criterion_main!(benches);
