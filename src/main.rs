use anyhow::{anyhow, Context, Result};
use docopt::Docopt;
use image::{Rgb, RgbImage};
use serde::Deserialize;
use tracing::info;

use polymaze::{
    cells::GridCoordinate,
    generators::Generator,
    grid::{CoordinateSmallVec, Grid},
    grid_displays::{self, GridDisplay, PathDisplay, StartEndPointsDisplay},
    grids,
    masks::{BinaryMask2D, Shape},
    pathing::{dijkstra_longest_path, Distances, Solver},
    renderers::{MazeRenderer, Point},
    topologies::Topology,
    units::{CellRadius, ColumnsCount, LevelsCount, RowsCount},
};
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;

const USAGE: &str = "Polymaze

Usage:
    polymaze_driver -h | --help
    polymaze_driver render (backtracker|prims|aldous-broder|wilsons|binary-tree|sidewinder|division|hunt-kill|kruskals|ellers) [options]

Options:
    -h --help             Show this screen.
    --topology=<name>     Cell topology: rect, hex, tri or polar [default: rect].
    --shape=<name>        Boundary mask: rectangle, circle, triangle or hexagon [default: rectangle].
    --rows=<r>            Grid rows (rings for polar) [default: 20].
    --columns=<c>         Grid columns (sectors for polar) [default: 20].
    --levels=<l>          Stacked levels joined by stairs [default: 1].
    --braid=<p>           Probability 0..1 of culling each dead end after generation [default: 0].
    --mask-file=<path>    Grayscale image whose dark pixels mask cells off.
    --solver=<name>       Route finder to run over the maze: bfs, dfs or astar.
    --show-path           Overlay the solved route on the text rendering.
    --show-distances      Overlay flood-fill distances on the text rendering.
    --mark-start-end      Mark the route endpoints on the text rendering.
    --text-out=<path>     Write the text rendering to a file instead of stdout.
    --image-out=<path>    Write a PNG rendering of the ground level's walls.
    --fov                 Overlay a field-of-view silhouette on the PNG.
    --cell-radius=<n>     Geometry scale for the PNG rendering [default: 12].
";

#[derive(Debug, Deserialize)]
struct MazeArgs {
    cmd_render: bool,
    cmd_backtracker: bool,
    cmd_prims: bool,
    cmd_aldous_broder: bool,
    cmd_wilsons: bool,
    cmd_binary_tree: bool,
    cmd_sidewinder: bool,
    cmd_division: bool,
    cmd_hunt_kill: bool,
    cmd_kruskals: bool,
    cmd_ellers: bool,
    flag_topology: String,
    flag_shape: String,
    flag_rows: usize,
    flag_columns: usize,
    flag_levels: usize,
    flag_braid: f64,
    flag_mask_file: String,
    flag_solver: String,
    flag_show_path: bool,
    flag_show_distances: bool,
    flag_mark_start_end: bool,
    flag_text_out: String,
    flag_image_out: String,
    flag_fov: bool,
    flag_cell_radius: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: MazeArgs = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    if !args.cmd_render {
        return Ok(());
    }

    let topology = Topology::from_name(&args.flag_topology)
        .ok_or_else(|| anyhow!("unknown topology {:?}", args.flag_topology))?;
    let shape = Shape::from_name(&args.flag_shape)
        .ok_or_else(|| anyhow!("unknown shape {:?}", args.flag_shape))?;
    let generator = chosen_generator(&args);

    let mut grid = grids::large_grid(topology,
                                     RowsCount(args.flag_rows),
                                     ColumnsCount(args.flag_columns),
                                     LevelsCount(args.flag_levels))
        .ok_or_else(|| anyhow!("grid of {}x{}x{} cells is too large",
                               args.flag_rows, args.flag_columns, args.flag_levels))?;

    grid.mask_shape(shape);
    if !args.flag_mask_file.is_empty() {
        let mask_image = image::open(Path::new(&args.flag_mask_file))
            .with_context(|| format!("failed to load mask image {:?}", args.flag_mask_file))?;
        grid.mask_image(&BinaryMask2D::from_image(&mask_image));
    }
    if grid.active_cells_count() == 0 {
        return Err(anyhow!("masking removed every cell from the grid"));
    }

    generator.generate(&mut grid);
    info!(generator = generator.name(), links = grid.links_count(), "maze generated");

    if args.flag_braid > 0.0 {
        let mut rng = rand_rng();
        grid.braid(args.flag_braid.min(1.0), &mut rng);
    }

    let (start, end) = route_endpoints(&grid);

    let solved_path = if wants_solve(&args) {
        let solver = if args.flag_solver.is_empty() {
            Solver::Bfs
        } else {
            Solver::from_name(&args.flag_solver)
                .ok_or_else(|| anyhow!("unknown solver {:?}", args.flag_solver))?
        };
        let path = solver.solve(&grid, start, end);
        info!(solver = solver.name(), length = path.len(), "route solved");
        path
    } else {
        Vec::new()
    };

    let text = render_text(&grid, &args, start, end, &solved_path)?;
    if args.flag_text_out.is_empty() {
        println!("{}", text);
    } else {
        write_text_file(&args.flag_text_out, &text)?;
    }

    if !args.flag_image_out.is_empty() {
        let png = render_image(&grid, &args, start)?;
        png.save(Path::new(&args.flag_image_out))
            .with_context(|| format!("failed to save {:?}", args.flag_image_out))?;
        info!(path = %args.flag_image_out, "image written");
    }

    Ok(())
}

fn chosen_generator(args: &MazeArgs) -> Generator {
    if args.cmd_prims {
        Generator::RandomizedPrims
    } else if args.cmd_aldous_broder {
        Generator::AldousBroder
    } else if args.cmd_wilsons {
        Generator::Wilsons
    } else if args.cmd_binary_tree {
        Generator::BinaryTree
    } else if args.cmd_sidewinder {
        Generator::Sidewinder
    } else if args.cmd_division {
        Generator::RecursiveDivision
    } else if args.cmd_hunt_kill {
        Generator::HuntAndKill
    } else if args.cmd_kruskals {
        Generator::Kruskals
    } else if args.cmd_ellers {
        Generator::Ellers
    } else {
        debug_assert!(args.cmd_backtracker);
        Generator::RecursiveBacktracker
    }
}

fn wants_solve(args: &MazeArgs) -> bool {
    !args.flag_solver.is_empty() || args.flag_show_path
}

fn rand_rng() -> rand_xorshift::XorShiftRng {
    use rand::SeedableRng;
    rand_xorshift::XorShiftRng::from_entropy()
}

/// The two ends of the longest route across the maze, falling back to the
/// first and last active cells when no route exists.
fn route_endpoints(grid: &Grid<u32>) -> (GridCoordinate, GridCoordinate) {
    if let Some(path) = dijkstra_longest_path::<u32, u32>(grid) {
        if let (Some(&start), Some(&end)) = (path.first(), path.last()) {
            return (start, end);
        }
    }
    let first = grid.iter().next();
    let last = grid.iter().last();
    match (first, last) {
        (Some(a), Some(b)) => (a, b),
        _ => (GridCoordinate::new(0, 0, 0), GridCoordinate::new(0, 0, 0)),
    }
}

fn render_text(grid: &Grid<u32>,
               args: &MazeArgs,
               start: GridCoordinate,
               end: GridCoordinate,
               solved_path: &[GridCoordinate])
               -> Result<String> {
    let path_display;
    let distance_display;
    let endpoint_display;
    let display: Option<&dyn GridDisplay> = if args.flag_show_path {
        path_display = PathDisplay::new(solved_path);
        Some(&path_display)
    } else if args.flag_show_distances {
        distance_display = Distances::<u32>::new(grid, start)
            .ok_or_else(|| anyhow!("no start cell for the distance overlay"))?;
        Some(&distance_display)
    } else if args.flag_mark_start_end {
        let starts: CoordinateSmallVec = [start].iter().cloned().collect();
        let ends: CoordinateSmallVec = [end].iter().cloned().collect();
        endpoint_display = StartEndPointsDisplay::new(starts, ends);
        Some(&endpoint_display)
    } else {
        None
    };

    let mut out = String::new();
    for level in 0..grid.levels().0 {
        if level > 0 {
            out.push('\n');
        }
        out.push_str(&grid_displays::render_level(grid, level as u32, display));
    }
    Ok(out)
}

fn write_text_file(path: &str, contents: &str) -> Result<()> {
    let mut file = File::create(Path::new(path))
        .with_context(|| format!("failed to create {:?}", path))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {:?}", path))?;
    Ok(())
}

const IMAGE_MARGIN: f64 = 16.0;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const WALL_COLOUR: Rgb<u8> = Rgb([30, 30, 30]);
const FOV_COLOUR: Rgb<u8> = Rgb([220, 60, 60]);
const OBSERVER_COLOUR: Rgb<u8> = Rgb([60, 60, 220]);

/// Rasterise the ground level's walls, plus an optional field-of-view
/// silhouette cast from the route start.
fn render_image(grid: &Grid<u32>, args: &MazeArgs, start: GridCoordinate) -> Result<RgbImage> {
    let mut renderer = MazeRenderer::new(grid.topology(),
                                         grid.rows(),
                                         grid.columns(),
                                         CellRadius(args.flag_cell_radius.max(2.0)),
                                         Point::new(0.0, 0.0));

    let segments = renderer.wall_segments(grid, 0);
    if segments.is_empty() {
        return Err(anyhow!("level 0 has no walls to draw"));
    }

    let fov = if args.flag_fov && start.level == 0 {
        let observer = renderer.get_pixel(start.row, start.column, 1.0, Point::new(0.0, 0.0));
        let radius = renderer.cell_radius() * 6.0;
        Some((observer, renderer.create_fov_geometry(grid, observer, 0, radius)))
    } else {
        None
    };

    // Fit the drawing to its own bounding box.
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for segment in &segments {
        for point in [segment.a, segment.b] {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
    }
    let offset = Point::new(IMAGE_MARGIN - min_x, IMAGE_MARGIN - min_y);
    let width = (max_x - min_x + 2.0 * IMAGE_MARGIN).ceil() as u32;
    let height = (max_y - min_y + 2.0 * IMAGE_MARGIN).ceil() as u32;

    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);
    for segment in &segments {
        draw_line(&mut img, segment.a, segment.b, offset, WALL_COLOUR);
    }

    if let Some((observer, silhouette)) = fov {
        for window in 0..silhouette.len() {
            let a = silhouette[window];
            let b = silhouette[(window + 1) % silhouette.len()];
            draw_line(&mut img, a, b, offset, FOV_COLOUR);
        }
        draw_line(&mut img, observer, observer, offset, OBSERVER_COLOUR);
    }

    Ok(img)
}

/// Plot a segment by sampling along its length; plenty for a diagnostic
/// export.
fn draw_line(img: &mut RgbImage, a: Point, b: Point, offset: Point, colour: Rgb<u8>) {
    let length = a.distance_to(b).max(1.0);
    let steps = (length * 2.0).ceil() as u32;
    for step in 0..=steps {
        let t = f64::from(step) / f64::from(steps);
        let x = a.x + (b.x - a.x) * t + offset.x;
        let y = a.y + (b.y - a.y) * t + offset.y;
        let (px, py) = (x.round() as i64, y.round() as i64);
        if px >= 0 && py >= 0 && (px as u32) < img.width() && (py as u32) < img.height() {
            img.put_pixel(px as u32, py as u32, colour);
        }
    }
}
