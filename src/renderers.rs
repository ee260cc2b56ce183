use std::f64::consts::PI;

use fnv::{FnvHashMap, FnvHashSet};
use petgraph::graph::IndexType;
use tracing::debug;

use crate::cells::{CellOrientation, GridCoordinate};
use crate::grid::Grid;
use crate::topologies::Topology;
use crate::units::{CellRadius, ColumnsCount, RowsCount};

/// Angular spacing of the field-of-view ray fan, in degrees.
const FOV_RAY_STEP_DEGREES: u32 = 6;
/// Occluders are gathered from a belt slightly wider than the field-of-view
/// radius so partially-out-of-range walls still block rays.
const FOV_PREFILTER_SLACK: f64 = 1.5;
/// Hit points are pushed a fraction of the beam thickness past the wall so
/// floating point slack cannot open seams in the silhouette.
const FOV_HIT_NUDGE: f64 = 0.4;
/// Wall vertices are rounded to this many decimal places before being
/// compared, merging points that drifted apart in floating point.
const VERTEX_PRECISION: f64 = 100.0;

#[derive(PartialEq, Copy, Clone, Debug)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Snap to the fixed vertex precision so shared corners compare equal.
    fn snapped(&self) -> Point {
        Point::new((self.x * VERTEX_PRECISION).round() / VERTEX_PRECISION,
                   (self.y * VERTEX_PRECISION).round() / VERTEX_PRECISION)
    }

    fn key(&self) -> (i64, i64) {
        ((self.x * VERTEX_PRECISION).round() as i64, (self.y * VERTEX_PRECISION).round() as i64)
    }
}

/// One opaque wall boundary between two cell slots (or a cell and the
/// outside), with endpoints snapped to the shared vertex precision.
#[derive(PartialEq, Copy, Clone, Debug)]
pub struct WallSegment {
    pub a: Point,
    pub b: Point,
}

/// A convex quadrilateral of occlusion geometry: either a beam along a wall
/// or a post over a wall vertex.
pub type OcclusionPolygon = [Point; 4];

/// Maps grid cells onto 2D geometry for one topology and produces the
/// occlusion and field-of-view data the display layer consumes.
///
/// The per-level occlusion cache has no staleness detection: whenever a
/// level's links change (generation finished, braiding applied) the owner
/// must call `invalidate_occlusion` before asking for geometry again.
pub struct MazeRenderer {
    topology: Topology,
    rows: RowsCount,
    columns: ColumnsCount,
    cell_radius: f64,
    origin: Point,
    inset_factor: f64,
    occlusion_cache: FnvHashMap<u32, Vec<OcclusionPolygon>>,
}

impl MazeRenderer {
    pub fn new(topology: Topology,
               rows: RowsCount,
               columns: ColumnsCount,
               cell_radius: CellRadius,
               origin: Point)
               -> MazeRenderer {
        MazeRenderer {
            topology,
            rows,
            columns,
            cell_radius: cell_radius.0,
            origin,
            inset_factor: 0.85,
            occlusion_cache: FnvHashMap::default(),
        }
    }

    /// Override the wall inset; the beam thickness is
    /// `cell_radius * (1 - inset_factor)`.
    pub fn with_inset_factor(mut self, inset_factor: f64) -> MazeRenderer {
        self.inset_factor = inset_factor;
        self
    }

    #[inline]
    pub fn cell_radius(&self) -> f64 {
        self.cell_radius
    }

    /// Thickness of occlusion beams and posts.
    #[inline]
    pub fn wall_thickness(&self) -> f64 {
        self.cell_radius * (1.0 - self.inset_factor)
    }

    /// The 2D centre of a cell, optionally scaled and offset (the exploded
    /// multi-level map view draws each floor small and shifted).
    pub fn get_pixel(&self, row: u32, column: u32, scale: f64, offset: Point) -> Point {
        let radius = self.cell_radius * scale;
        let ox = self.origin.x + offset.x;
        let oy = self.origin.y + offset.y;
        let (rows, columns) = (self.rows.0 as f64, self.columns.0 as f64);
        let (r, c) = (f64::from(row), f64::from(column));

        match self.topology {
            Topology::Hex => {
                let w = 3.0f64.sqrt() * radius;
                let h = 1.5 * radius;
                let start_x = ox - (columns + 0.5) * w / 2.0;
                let start_y = oy - ((rows - 1.0) * h + 2.0 * radius) / 2.0;
                let row_shift = if row % 2 == 1 { w / 2.0 } else { 0.0 };
                Point::new(start_x + c * w + row_shift + w / 2.0, start_y + r * h + radius)
            }
            Topology::Tri => {
                let side = radius * 3.0f64.sqrt();
                let grid_w = (columns + 1.0) * (side / 2.0);
                let grid_h = rows * 1.5 * radius;
                let start_x = ox - grid_w / 2.0;
                let start_y = oy - grid_h / 2.0;
                let lift = match CellOrientation::of(row, column) {
                    CellOrientation::Upright => 0.5 * radius,
                    CellOrientation::Inverted => radius,
                };
                Point::new(start_x + (c + 1.0) * (side / 2.0), start_y + r * 1.5 * radius + lift)
            }
            Topology::Polar => {
                let ring_width = radius * 1.5;
                let ring_radius = ring_width * 2.0 + r * ring_width + ring_width / 2.0;
                let angle = c * (2.0 * PI / columns) - PI / 2.0;
                Point::new(ox + ring_radius * angle.cos(), oy + ring_radius * angle.sin())
            }
            Topology::Rect => {
                let side = radius * 2.0;
                let start_x = ox - (columns * side) / 2.0;
                let start_y = oy - (rows * side) / 2.0;
                Point::new(start_x + c * side + radius, start_y + r * side + radius)
            }
        }
    }

    /// Corner points of a triangular cell.
    pub fn get_tri_verts(&self, row: u32, column: u32, centre: Point, radius: f64) -> [Point; 3] {
        let half_side = radius * 3.0f64.sqrt() / 2.0;
        match CellOrientation::of(row, column) {
            CellOrientation::Upright => [Point::new(centre.x, centre.y + radius),
                                         Point::new(centre.x + half_side, centre.y - radius / 2.0),
                                         Point::new(centre.x - half_side, centre.y - radius / 2.0)],
            CellOrientation::Inverted => [Point::new(centre.x, centre.y - radius),
                                          Point::new(centre.x + half_side, centre.y + radius / 2.0),
                                          Point::new(centre.x - half_side, centre.y + radius / 2.0)],
        }
    }

    /// Every closed wall boundary of one level as de-duplicated segments with
    /// snapped endpoints. A boundary is closed when the adjacent slot is
    /// missing, masked, or simply not linked.
    pub fn wall_segments<Ix: IndexType>(&self, grid: &Grid<Ix>, level: u32) -> Vec<WallSegment> {
        let mut processed: FnvHashSet<((i64, i64), (i64, i64))> = FnvHashSet::default();
        let mut segments = Vec::new();
        let radius = self.cell_radius;

        for cell in grid.iter().filter(|c| c.level == level) {
            let centre = self.get_pixel(cell.row, cell.column, 1.0, Point::new(0.0, 0.0));
            match self.topology {
                Topology::Rect => {
                    let walls: [(i32, i32, f64, f64, f64, f64); 4] =
                        [(1, 0, -radius, radius, radius, radius),
                         (0, -1, -radius, -radius, -radius, radius),
                         (-1, 0, -radius, -radius, radius, -radius),
                         (0, 1, radius, -radius, radius, radius)];
                    for (dr, dc, x1, y1, x2, y2) in walls {
                        if self.is_wall(grid, cell, dr, dc) {
                            push_segment(&mut segments,
                                         &mut processed,
                                         Point::new(centre.x + x1, centre.y + y1),
                                         Point::new(centre.x + x2, centre.y + y2));
                        }
                    }
                }
                Topology::Hex => {
                    let angles = [30.0f64, 90.0, 150.0, 210.0, 270.0, 330.0];
                    let deltas: [(i32, i32); 6] = if cell.row % 2 == 0 {
                        [(1, 0), (1, -1), (0, -1), (-1, -1), (-1, 0), (0, 1)]
                    } else {
                        [(1, 1), (1, 0), (0, -1), (-1, 0), (-1, 1), (0, 1)]
                    };
                    for (i, &(dr, dc)) in deltas.iter().enumerate() {
                        if self.is_wall(grid, cell, dr, dc) {
                            let a1 = angles[i].to_radians();
                            let a2 = angles[(i + 1) % 6].to_radians();
                            push_segment(&mut segments,
                                         &mut processed,
                                         Point::new(centre.x + radius * a1.cos(), centre.y + radius * a1.sin()),
                                         Point::new(centre.x + radius * a2.cos(), centre.y + radius * a2.sin()));
                        }
                    }
                }
                Topology::Tri => {
                    let [p1, p2, p3] = self.get_tri_verts(cell.row, cell.column, centre, radius);
                    let base_delta: (i32, i32) = match CellOrientation::of(cell.row, cell.column) {
                        CellOrientation::Upright => (-1, 0),
                        CellOrientation::Inverted => (1, 0),
                    };
                    for (v1, v2, (dr, dc)) in [(p2, p3, base_delta), (p1, p2, (0, 1)), (p1, p3, (0, -1))] {
                        if self.is_wall(grid, cell, dr, dc) {
                            push_segment(&mut segments, &mut processed, v1, v2);
                        }
                    }
                }
                Topology::Polar => {
                    let ring_width = radius * 1.5;
                    let inner = ring_width * 2.0 + f64::from(cell.row) * ring_width;
                    let outer = inner + ring_width;
                    let step = 2.0 * PI / self.columns.0 as f64;
                    let theta_start = f64::from(cell.column) * step - PI / 2.0;
                    let theta_end = f64::from(cell.column + 1) * step - PI / 2.0;
                    let (ox, oy) = (self.origin.x, self.origin.y);

                    let arc = |ring: f64, theta: f64| Point::new(ox + ring * theta.cos(), oy + ring * theta.sin());

                    if cell.row == 0 || self.is_wall(grid, cell, -1, 0) {
                        push_segment(&mut segments, &mut processed, arc(inner, theta_start), arc(inner, theta_end));
                    }
                    if self.is_wall(grid, cell, 1, 0) {
                        push_segment(&mut segments, &mut processed, arc(outer, theta_start), arc(outer, theta_end));
                    }
                    // The counter-clockwise spoke; the neighbour's own spoke
                    // covers the other side.
                    let sectors = self.columns.0 as u32;
                    let ccw_column = (cell.column + sectors - 1) % sectors;
                    let ccw = GridCoordinate::new(cell.row, ccw_column, cell.level);
                    if ccw == cell || !grid.is_valid_coordinate(ccw) || !grid.is_linked(cell, ccw) {
                        push_segment(&mut segments, &mut processed, arc(inner, theta_start), arc(outer, theta_start));
                    }
                }
            }
        }
        segments
    }

    /// The cached occlusion geometry for a level: one beam per closed wall
    /// segment plus one post per wall vertex ("post and beam"), making the
    /// wall set watertight at corners.
    pub fn get_occlusion_polygons<Ix: IndexType>(&mut self, grid: &Grid<Ix>, level: u32) -> &[OcclusionPolygon] {
        if !self.occlusion_cache.contains_key(&level) {
            let polygons = self.build_occlusion_polygons(grid, level);
            debug!(level, polygons = polygons.len(), "occlusion geometry rebuilt");
            self.occlusion_cache.insert(level, polygons);
        }
        self.occlusion_cache.get(&level).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Drop one level's cached occlusion geometry. Must be called whenever
    /// that level's link state changes.
    pub fn invalidate_occlusion(&mut self, level: u32) {
        self.occlusion_cache.remove(&level);
    }

    pub fn invalidate_all_occlusion(&mut self) {
        self.occlusion_cache.clear();
    }

    fn build_occlusion_polygons<Ix: IndexType>(&self, grid: &Grid<Ix>, level: u32) -> Vec<OcclusionPolygon> {
        let thickness = self.wall_thickness();
        let half = thickness / 2.0;
        let mut polygons = Vec::new();
        let mut posted: FnvHashSet<(i64, i64)> = FnvHashSet::default();

        for segment in self.wall_segments(grid, level) {
            let length = segment.a.distance_to(segment.b);
            if length < f64::EPSILON {
                continue;
            }
            let dx = (segment.b.x - segment.a.x) / length;
            let dy = (segment.b.y - segment.a.y) / length;
            let (nx, ny) = (-dy * half, dx * half);
            polygons.push([Point::new(segment.a.x + nx, segment.a.y + ny),
                           Point::new(segment.b.x + nx, segment.b.y + ny),
                           Point::new(segment.b.x - nx, segment.b.y - ny),
                           Point::new(segment.a.x - nx, segment.a.y - ny)]);

            for vertex in [segment.a, segment.b] {
                if posted.insert(vertex.key()) {
                    polygons.push([Point::new(vertex.x - half, vertex.y - half),
                                   Point::new(vertex.x + half, vertex.y - half),
                                   Point::new(vertex.x + half, vertex.y + half),
                                   Point::new(vertex.x - half, vertex.y + half)]);
                }
            }
        }
        polygons
    }

    /// Cast a fan of rays from `observer` against the level's occlusion
    /// geometry and return the visible-area silhouette, one point per ray.
    pub fn create_fov_geometry<Ix: IndexType>(&mut self,
                                              grid: &Grid<Ix>,
                                              observer: Point,
                                              level: u32,
                                              radius: f64)
                                              -> Vec<Point> {
        let nudge = FOV_HIT_NUDGE * self.wall_thickness();
        let prefilter = radius * FOV_PREFILTER_SLACK;

        let edges: Vec<(Point, Point)> = self.get_occlusion_polygons(grid, level)
            .iter()
            .flat_map(|quad| {
                (0..4).map(move |i| (quad[i], quad[(i + 1) % 4]))
            })
            .filter(|&(a, b)| {
                observer.distance_to(a) <= prefilter || observer.distance_to(b) <= prefilter
            })
            .collect();

        let mut silhouette = Vec::with_capacity((360 / FOV_RAY_STEP_DEGREES) as usize);
        for angle_degrees in (0..360).step_by(FOV_RAY_STEP_DEGREES as usize) {
            let angle = f64::from(angle_degrees).to_radians();
            let direction = Point::new(angle.cos(), angle.sin());

            let hit = edges
                .iter()
                .filter_map(|&(a, b)| ray_segment_intersection(observer, direction, a, b))
                .fold(None::<f64>, |best, t| Some(best.map_or(t, |b| b.min(t))));

            let distance = match hit {
                Some(t) if t <= radius => t + nudge,
                _ => radius,
            };
            silhouette.push(Point::new(observer.x + direction.x * distance,
                                       observer.y + direction.y * distance));
        }
        silhouette
    }
}

/// Distance along the ray to the segment, if the ray actually crosses it.
/// Near-parallel pairs, hits behind the ray origin and misses beyond the
/// segment ends are all rejected.
fn ray_segment_intersection(origin: Point, direction: Point, a: Point, b: Point) -> Option<f64> {
    let edge_x = b.x - a.x;
    let edge_y = b.y - a.y;
    let det = edge_x * direction.y - edge_y * direction.x;
    if det.abs() < 1e-9 {
        return None;
    }
    let to_a_x = a.x - origin.x;
    let to_a_y = a.y - origin.y;
    let t = (edge_x * to_a_y - edge_y * to_a_x) / det;
    let u = (direction.x * to_a_y - direction.y * to_a_x) / det;
    if t >= 0.0 && (0.0..=1.0).contains(&u) {
        Some(t)
    } else {
        None
    }
}

fn push_segment(segments: &mut Vec<WallSegment>,
                processed: &mut FnvHashSet<((i64, i64), (i64, i64))>,
                a: Point,
                b: Point) {
    let (a, b) = (a.snapped(), b.snapped());
    let (ka, kb) = (a.key(), b.key());
    let id = if ka <= kb { (ka, kb) } else { (kb, ka) };
    if processed.insert(id) {
        segments.push(WallSegment { a, b });
    }
}

impl MazeRenderer {
    fn is_wall<Ix: IndexType>(&self, grid: &Grid<Ix>, cell: GridCoordinate, dr: i32, dc: i32) -> bool {
        match self.topology {
            Topology::Polar if dc != 0 => {
                let sectors = self.columns.0 as u32;
                let column = (cell.column as i64 + i64::from(dc)).rem_euclid(i64::from(sectors)) as u32;
                let neighbour = GridCoordinate::new(cell.row, column, cell.level);
                !grid.is_valid_coordinate(neighbour) || !grid.is_linked(cell, neighbour)
            }
            _ => match grid.offset(cell, dr, dc, 0) {
                Some(neighbour) => !grid.is_linked(cell, neighbour),
                None => true,
            },
        }
    }
}
