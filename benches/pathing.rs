use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;

use polymaze::{
    cells::GridCoordinate,
    generators::Generator,
    grids::{large_grid, LargeGrid},
    pathing::{dijkstra_longest_path, Distances, Solver},
    topologies::Topology,
    units::{ColumnsCount, LevelsCount, RowsCount},
};

fn maze_32() -> LargeGrid {
    let mut g = large_grid(Topology::Rect, RowsCount(32), ColumnsCount(32), LevelsCount(1))
        .expect("bench grid fits a u32 index");
    Generator::RecursiveBacktracker.generate_with_rng(&mut g, XorShiftRng::seed_from_u64(77));
    g
}

fn bench_bfs_32(c: &mut Criterion) {
    let g = maze_32();
    c.bench_function("bfs_solve_32", move |b| {
        b.iter(|| Solver::Bfs.solve(&g, GridCoordinate::new(0, 0, 0), GridCoordinate::new(31, 31, 0)))
    });
}

fn bench_dfs_32(c: &mut Criterion) {
    let g = maze_32();
    c.bench_function("dfs_solve_32", move |b| {
        b.iter(|| Solver::Dfs.solve(&g, GridCoordinate::new(0, 0, 0), GridCoordinate::new(31, 31, 0)))
    });
}

fn bench_a_star_32(c: &mut Criterion) {
    let g = maze_32();
    c.bench_function("a_star_solve_32", move |b| {
        b.iter(|| Solver::AStar.solve(&g, GridCoordinate::new(0, 0, 0), GridCoordinate::new(31, 31, 0)))
    });
}

fn bench_distances_32(c: &mut Criterion) {
    let g = maze_32();
    c.bench_function("distances_32", move |b| {
        b.iter(|| Distances::<u32>::new(&g, GridCoordinate::new(0, 0, 0)))
    });
}

fn bench_longest_path_32(c: &mut Criterion) {
    let g = maze_32();
    c.bench_function("longest_path_32", move |b| {
        b.iter(|| dijkstra_longest_path::<u32, u32>(&g))
    });
}

criterion_group!(
    benches,
    bench_bfs_32,
    bench_dfs_32,
    bench_a_star_32,
    bench_distances_32,
    bench_longest_path_32
);
criterion_main!(benches);
