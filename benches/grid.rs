use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;

use polymaze::{
    generators::Generator,
    grids::large_grid,
    masks::Shape,
    topologies::Topology,
    units::{ColumnsCount, LevelsCount, RowsCount},
};

fn bench_grid_construction_32(c: &mut Criterion) {
    c.bench_function("grid_construction_32", |b| {
        b.iter(|| large_grid(Topology::Rect, RowsCount(32), ColumnsCount(32), LevelsCount(1)))
    });
}

fn bench_hex_grid_construction_32(c: &mut Criterion) {
    c.bench_function("hex_grid_construction_32", |b| {
        b.iter(|| large_grid(Topology::Hex, RowsCount(32), ColumnsCount(32), LevelsCount(1)))
    });
}

fn bench_circle_mask_32(c: &mut Criterion) {
    c.bench_function("circle_mask_32", |b| {
        b.iter(|| {
            let mut g = large_grid(Topology::Rect, RowsCount(32), ColumnsCount(32), LevelsCount(1))
                .expect("bench grid fits a u32 index");
            g.mask_shape(Shape::Circle);
            g.active_cells_count()
        })
    });
}

fn bench_braid_32(c: &mut Criterion) {
    c.bench_function("braid_32", |b| {
        b.iter(|| {
            let mut g = large_grid(Topology::Rect, RowsCount(32), ColumnsCount(32), LevelsCount(1))
                .expect("bench grid fits a u32 index");
            Generator::RecursiveBacktracker
                .generate_with_rng(&mut g, XorShiftRng::seed_from_u64(1));
            g.braid(0.5, &mut XorShiftRng::seed_from_u64(2))
        })
    });
}

criterion_group!(
    benches,
    bench_grid_construction_32,
    bench_hex_grid_construction_32,
    bench_circle_mask_32,
    bench_braid_32
);
criterion_main!(benches);
