//! Cascade engine benchmarks

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gr_cascade::{CascadeEngine, FixedCells, Grid, find_clusters, seeded_rng};

fn bench_spin(c: &mut Criterion) {
    let engine = CascadeEngine::grocery_run().unwrap();
    let mut rng = seeded_rng(1);

    c.bench_function("spin_grocery_run", |b| {
        b.iter(|| {
            let _ = black_box(engine.spin(&mut rng));
        })
    });
}

fn bench_find_clusters(c: &mut Criterion) {
    let engine = CascadeEngine::grocery_run().unwrap();
    let config = engine.config();
    let mut rng = seeded_rng(2);
    let grids: Vec<Grid> = (0..64)
        .map(|_| Grid::generate(config.grid_size, engine.base_selector(), &mut rng))
        .collect();

    c.bench_function("find_clusters_5x5", |b| {
        b.iter(|| {
            for grid in &grids {
                black_box(find_clusters(
                    black_box(grid),
                    &config.symbols,
                    config.min_match,
                    FixedCells::none(),
                ));
            }
        })
    });
}

criterion_group!(benches, bench_spin, bench_find_clusters);
criterion_main!(benches);
