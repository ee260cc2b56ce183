use smallvec::SmallVec;

use crate::cells::{CellOrientation, GridCoordinate};
use crate::units::{ColumnsCount, RowsCount};

/// The closed set of planar adjacency strategies a grid can be built with.
///
/// A topology decides, once at grid construction, which cells are geometric
/// neighbours of which. It also maps each cell to a normalized [-1, 1]
/// coordinate used by the shape masks. Vertical (level to level) adjacency is
/// the same for every topology: the identical (row, column) one level up or
/// down.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Topology {
    Rect,
    Hex,
    Tri,
    Polar,
}

pub type PlanarNeighbours = SmallVec<[GridCoordinate; 6]>;

impl Topology {
    pub fn from_name(name: &str) -> Option<Topology> {
        match name {
            "rect" | "square" => Some(Topology::Rect),
            "hex" | "hexagonal" => Some(Topology::Hex),
            "tri" | "triangular" => Some(Topology::Tri),
            "polar" | "circular" => Some(Topology::Polar),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Topology::Rect => "rect",
            Topology::Hex => "hex",
            Topology::Tri => "tri",
            Topology::Polar => "polar",
        }
    }

    /// All in-bounds cells geometrically adjacent to `coord` on its own
    /// level, in a stable order. Does not know about masking: the grid
    /// filters inactive cells out of every query.
    pub fn planar_neighbours(
        &self,
        coord: GridCoordinate,
        rows: RowsCount,
        columns: ColumnsCount,
    ) -> PlanarNeighbours {
        let mut neighbours = PlanarNeighbours::new();
        match *self {
            Topology::Rect => {
                self.offset_deltas(coord, &[(-1, 0), (1, 0), (0, 1), (0, -1)], rows, columns, &mut neighbours);
            }
            Topology::Hex => {
                // Pointy-top, odd-r offset layout: odd rows are shoved half a
                // cell to the right, so the diagonal column offsets flip with
                // row parity.
                let diagonals: [(i32, i32); 4] = if coord.row % 2 == 0 {
                    [(-1, -1), (-1, 0), (1, -1), (1, 0)]
                } else {
                    [(-1, 0), (-1, 1), (1, 0), (1, 1)]
                };
                self.offset_deltas(coord, &[(0, -1), (0, 1)], rows, columns, &mut neighbours);
                self.offset_deltas(coord, &diagonals, rows, columns, &mut neighbours);
            }
            Topology::Tri => {
                // Upright triangles share their base with the row below,
                // inverted ones with the row above.
                let base_row: (i32, i32) = match CellOrientation::of(coord.row, coord.column) {
                    CellOrientation::Upright => (-1, 0),
                    CellOrientation::Inverted => (1, 0),
                };
                self.offset_deltas(coord, &[(0, -1), (0, 1), base_row], rows, columns, &mut neighbours);
            }
            Topology::Polar => {
                // row = ring, column = angular sector; sectors wrap.
                let sectors = columns.0 as u32;
                if sectors > 1 {
                    let cw = (coord.column + 1) % sectors;
                    let ccw = (coord.column + sectors - 1) % sectors;
                    neighbours.push(GridCoordinate::new(coord.row, cw, coord.level));
                    if ccw != cw {
                        neighbours.push(GridCoordinate::new(coord.row, ccw, coord.level));
                    }
                }
                if coord.row > 0 {
                    neighbours.push(GridCoordinate::new(coord.row - 1, coord.column, coord.level));
                }
                if (coord.row as usize) + 1 < rows.0 {
                    neighbours.push(GridCoordinate::new(coord.row + 1, coord.column, coord.level));
                }
            }
        }
        neighbours
    }

    /// Map a cell to a normalized [-1, 1] × [-1, 1] point for shape masking.
    pub fn unit_point(&self, coord: GridCoordinate, rows: RowsCount, columns: ColumnsCount) -> (f64, f64) {
        let (r, c) = (f64::from(coord.row), f64::from(coord.column));
        let (row_count, col_count) = (rows.0 as f64, columns.0 as f64);

        match *self {
            Topology::Rect | Topology::Tri => {
                (axis_unit(c, col_count - 1.0), axis_unit(r, row_count - 1.0))
            }
            Topology::Hex => {
                // Axial to Cartesian: odd rows sit half a column to the right,
                // so the horizontal extent grows by that half cell.
                let offset = if coord.row % 2 == 1 { 0.5 } else { 0.0 };
                let x_extent = if rows.0 > 1 { col_count - 0.5 } else { col_count - 1.0 };
                (axis_unit(c + offset, x_extent), axis_unit(r, row_count - 1.0))
            }
            Topology::Polar => {
                let radius = (r + 0.5) / row_count.max(1.0);
                let angle = (c + 0.5) * (2.0 * std::f64::consts::PI) / col_count.max(1.0);
                (radius * angle.cos(), radius * angle.sin())
            }
        }
    }

    fn offset_deltas(
        &self,
        coord: GridCoordinate,
        deltas: &[(i32, i32)],
        rows: RowsCount,
        columns: ColumnsCount,
        out: &mut PlanarNeighbours,
    ) {
        for &(dr, dc) in deltas {
            let row = i64::from(coord.row) + i64::from(dr);
            let column = i64::from(coord.column) + i64::from(dc);
            if row >= 0 && (row as usize) < rows.0 && column >= 0 && (column as usize) < columns.0 {
                out.push(GridCoordinate::new(row as u32, column as u32, coord.level));
            }
        }
    }
}

fn axis_unit(value: f64, extent: f64) -> f64 {
    if extent > 0.0 {
        2.0 * value / extent - 1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {

    use itertools::Itertools;

    use super::*;

    fn neighbours_of(topology: Topology, r: u32, c: u32, rows: usize, cols: usize) -> Vec<GridCoordinate> {
        topology
            .planar_neighbours(GridCoordinate::new(r, c, 0), RowsCount(rows), ColumnsCount(cols))
            .iter()
            .cloned()
            .sorted()
            .collect()
    }

    #[test]
    fn rect_corner_and_centre() {
        assert_eq!(neighbours_of(Topology::Rect, 0, 0, 3, 3).len(), 2);
        assert_eq!(neighbours_of(Topology::Rect, 1, 1, 3, 3).len(), 4);
    }

    #[test]
    fn hex_centre_has_six() {
        let n = neighbours_of(Topology::Hex, 1, 1, 3, 3);
        assert_eq!(n.len(), 6);
        // Odd row: the diagonals lean right.
        assert!(n.contains(&GridCoordinate::new(0, 2, 0)));
        assert!(n.contains(&GridCoordinate::new(2, 2, 0)));
    }

    #[test]
    fn tri_orientation_switches_base_row() {
        let upright = neighbours_of(Topology::Tri, 1, 1, 3, 3);
        assert!(upright.contains(&GridCoordinate::new(0, 1, 0)));
        assert!(!upright.contains(&GridCoordinate::new(2, 1, 0)));

        let inverted = neighbours_of(Topology::Tri, 1, 2, 3, 3);
        assert!(inverted.contains(&GridCoordinate::new(2, 2, 0)));
        assert!(!inverted.contains(&GridCoordinate::new(0, 2, 0)));
    }

    #[test]
    fn polar_sectors_wrap() {
        let n = neighbours_of(Topology::Polar, 1, 0, 3, 8);
        assert_eq!(n.len(), 4);
        assert!(n.contains(&GridCoordinate::new(1, 7, 0)));
        assert!(n.contains(&GridCoordinate::new(1, 1, 0)));
        assert!(n.contains(&GridCoordinate::new(0, 0, 0)));
        assert!(n.contains(&GridCoordinate::new(2, 0, 0)));
    }

    #[test]
    fn polar_two_sector_ring_has_no_duplicate_side() {
        let n = neighbours_of(Topology::Polar, 0, 0, 2, 2);
        // cw and ccw land on the same sector; it must appear once.
        assert_eq!(n.iter().filter(|gc| gc.column == 1 && gc.row == 0).count(), 1);
    }

    #[test]
    fn unit_points_cover_the_square() {
        let (x0, y0) = Topology::Rect.unit_point(GridCoordinate::new(0, 0, 0), RowsCount(5), ColumnsCount(5));
        let (x1, y1) = Topology::Rect.unit_point(GridCoordinate::new(4, 4, 0), RowsCount(5), ColumnsCount(5));
        assert_eq!((x0, y0), (-1.0, -1.0));
        assert_eq!((x1, y1), (1.0, 1.0));
    }

    #[test]
    fn polar_unit_points_stay_in_the_disc() {
        for r in 0..4u32 {
            for c in 0..12u32 {
                let (x, y) = Topology::Polar.unit_point(GridCoordinate::new(r, c, 0), RowsCount(4), ColumnsCount(12));
                assert!(x * x + y * y <= 1.0 + 1e-9);
            }
        }
    }
}
