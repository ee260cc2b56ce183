use bit_set::BitSet;
use petgraph::graph::{self, Graph};
pub use petgraph::graph::IndexType;
use petgraph::visit::EdgeRef;
use petgraph::Undirected;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_xorshift::XorShiftRng;
use smallvec::SmallVec;
use std::fmt;
use std::slice;
use thiserror::Error;
use tracing::debug;

use crate::cells::GridCoordinate;
use crate::masks::{BinaryMask2D, Shape};
use crate::topologies::Topology;
use crate::units::{ColumnIndex, ColumnsCount, EdgesCount, LevelIndex, LevelsCount, NodesCount,
                   RowIndex, RowsCount};

pub type CoordinateSmallVec = SmallVec<[GridCoordinate; 8]>;

#[derive(Eq, PartialEq, Copy, Clone, Debug, Error)]
pub enum CellLinkError {
    #[error("coordinate is out of the grid or masked off")]
    InvalidGridCoordinate,
    #[error("a cell cannot be linked to itself")]
    SelfLink,
    #[error("only adjacent cells can be linked")]
    NotNeighbours,
}

/// A maze grid: a dense arena of cells under one topology, with geometric
/// adjacency fixed at construction and passages ("links") carved into an
/// undirected graph afterwards.
///
/// Links are symmetric by construction - an undirected petgraph edge cannot
/// be one-sided. Cells can be deactivated by masking; inactive cells are
/// invisible to every query except the masking routines themselves.
pub struct Grid<Ix: IndexType = u32> {
    graph: Graph<(), (), Undirected, Ix>,
    neighbour_table: Vec<CoordinateSmallVec>,
    active: BitSet,
    rows: RowsCount,
    columns: ColumnsCount,
    levels: LevelsCount,
    topology: Topology,
}

impl<Ix: IndexType> fmt::Debug for Grid<Ix> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,
               "Grid :: topology: {:?}, rows: {:?}, columns: {:?}, levels: {:?}, links: {}",
               self.topology, self.rows, self.columns, self.levels, self.links_count())
    }
}

impl<Ix: IndexType> Grid<Ix> {
    /// Build a grid and compute every cell's neighbours exactly once.
    ///
    /// The cell count must be representable by the graph index type `Ix` -
    /// the size-checked constructors in `grids` guard that for callers.
    pub fn new(topology: Topology,
               rows: RowsCount,
               columns: ColumnsCount,
               levels: LevelsCount)
               -> Grid<Ix> {

        let (NodesCount(nodes), EdgesCount(edges)) = graph_size(rows, columns, levels);

        let mut grid = Grid {
            graph: Graph::with_capacity(nodes, edges),
            neighbour_table: Vec::with_capacity(nodes),
            active: BitSet::with_capacity(nodes),
            rows,
            columns,
            levels,
            topology,
        };
        for _ in 0..nodes {
            let _ = grid.graph.add_node(());
        }

        for index in 0..nodes {
            let coord = grid.coordinate_from_index(index);
            let mut neighbours = CoordinateSmallVec::new();
            for n in topology.planar_neighbours(coord, rows, columns) {
                neighbours.push(n);
            }
            for delta in [-1i32, 1] {
                if let Some(above_or_below) = coord.offset_level(delta) {
                    if (above_or_below.level as usize) < levels.0 {
                        neighbours.push(above_or_below);
                    }
                }
            }
            grid.neighbour_table.push(neighbours);
            grid.active.insert(index);
        }

        grid
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    #[inline]
    pub fn rows(&self) -> RowsCount {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> ColumnsCount {
        self.columns
    }

    #[inline]
    pub fn levels(&self) -> LevelsCount {
        self.levels
    }

    /// Total number of cell slots, active or not.
    #[inline]
    pub fn size(&self) -> usize {
        self.rows.0 * self.columns.0 * self.levels.0
    }

    /// Number of cells still visible to algorithms after masking.
    #[inline]
    pub fn active_cells_count(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn links_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The cell at (row, column, level), if it is in bounds and active.
    pub fn get_cell(&self, row: RowIndex, column: ColumnIndex, level: LevelIndex) -> Option<GridCoordinate> {
        if row.0 < self.rows.0 && column.0 < self.columns.0 && level.0 < self.levels.0 {
            let coord = GridCoordinate::new(row.0 as u32, column.0 as u32, level.0 as u32);
            if self.is_valid_coordinate(coord) {
                return Some(coord);
            }
        }
        None
    }

    /// The cell offset from `coord` by (row, column, level) deltas, if that
    /// cell exists and is active. Saves every call site from doing its own
    /// signed underflow checks.
    pub fn offset(&self, coord: GridCoordinate, dr: i32, dc: i32, dl: i32) -> Option<GridCoordinate> {
        let row = i64::from(coord.row) + i64::from(dr);
        let column = i64::from(coord.column) + i64::from(dc);
        let level = i64::from(coord.level) + i64::from(dl);
        if row >= 0 && column >= 0 && level >= 0 {
            self.get_cell(RowIndex(row as usize), ColumnIndex(column as usize), LevelIndex(level as usize))
        } else {
            None
        }
    }

    /// Is the coordinate within the grid's dimensions and not masked off?
    #[inline]
    pub fn is_valid_coordinate(&self, coord: GridCoordinate) -> bool {
        self.slot_index(coord)
            .map_or(false, |index| self.active.contains(index))
    }

    /// A uniformly random active cell. None when masking has removed every
    /// cell, which callers treat as "nothing to do".
    pub fn random_cell(&self, rng: &mut XorShiftRng) -> Option<GridCoordinate> {
        let count = self.active.len();
        if count == 0 {
            return None;
        }
        let pick = rng.gen_range(0..count);
        self.active
            .iter()
            .nth(pick)
            .map(|index| self.coordinate_from_index(index))
    }

    /// Open a passage between two adjacent active cells.
    pub fn link(&mut self, a: GridCoordinate, b: GridCoordinate) -> Result<(), CellLinkError> {
        if a == b {
            return Err(CellLinkError::SelfLink);
        }
        let (a_index, b_index) = match (self.active_index(a), self.active_index(b)) {
            (Some(ai), Some(bi)) => (ai, bi),
            _ => return Err(CellLinkError::InvalidGridCoordinate),
        };
        if !self.neighbour_table[a_index].iter().any(|&n| n == b) {
            return Err(CellLinkError::NotNeighbours);
        }
        let _ = self.graph.update_edge(graph::NodeIndex::<Ix>::new(a_index),
                                       graph::NodeIndex::<Ix>::new(b_index),
                                       ());
        Ok(())
    }

    /// Close the passage between two cells if one exists. Returns true when a
    /// link was removed.
    pub fn unlink(&mut self, a: GridCoordinate, b: GridCoordinate) -> bool {
        if let (Some(a_index), Some(b_index)) = (self.active_index(a), self.active_index(b)) {
            if let Some(edge) = self.graph.find_edge(graph::NodeIndex::<Ix>::new(a_index),
                                                     graph::NodeIndex::<Ix>::new(b_index)) {
                // Invalidates the highest edge index in the graph, which is
                // fine as edge indices are never stored.
                self.graph.remove_edge(edge);
                return true;
            }
        }
        false
    }

    /// Cells joined to `coord` by an open passage. None for an invalid or
    /// masked coordinate.
    pub fn links(&self, coord: GridCoordinate) -> Option<CoordinateSmallVec> {
        self.active_index(coord).map(|index| {
            let node = graph::NodeIndex::<Ix>::new(index);
            self.graph
                .edges(node)
                .map(|edge| {
                    let other = if edge.source() == node { edge.target() } else { edge.source() };
                    self.coordinate_from_index(other.index())
                })
                .collect()
        })
    }

    /// Cells geometrically adjacent to `coord`, linked or not. Inactive
    /// neighbours are filtered out. Empty for an invalid coordinate.
    pub fn neighbours(&self, coord: GridCoordinate) -> CoordinateSmallVec {
        self.active_index(coord)
            .map(|index| {
                self.neighbour_table[index]
                    .iter()
                    .cloned()
                    .filter(|&n| self.is_valid_coordinate(n))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_linked(&self, a: GridCoordinate, b: GridCoordinate) -> bool {
        if let (Some(a_index), Some(b_index)) = (self.active_index(a), self.active_index(b)) {
            self.graph
                .find_edge(graph::NodeIndex::<Ix>::new(a_index), graph::NodeIndex::<Ix>::new(b_index))
                .is_some()
        } else {
            false
        }
    }

    /// A dead end has exactly one open passage.
    pub fn is_dead_end(&self, coord: GridCoordinate) -> bool {
        self.links(coord).map_or(false, |links| links.len() == 1)
    }

    /// Convert a grid coordinate to an index in `0..grid.size()`. None if the
    /// coordinate is out of bounds or masked off.
    #[inline]
    pub fn grid_coordinate_to_index(&self, coord: GridCoordinate) -> Option<usize> {
        self.active_index(coord)
    }

    #[inline]
    pub fn coordinate_from_index(&self, index: usize) -> GridCoordinate {
        let area = self.rows.0 * self.columns.0;
        let level = index / area;
        let planar = index % area;
        GridCoordinate::new((planar / self.columns.0) as u32,
                            (planar % self.columns.0) as u32,
                            level as u32)
    }

    /// Every active cell in `(level, row, column)` order.
    pub fn iter(&self) -> CellIter<'_, Ix> {
        CellIter {
            grid: self,
            next_index: 0,
            capacity: self.size(),
        }
    }

    /// Rows of cell slots, one `Vec` per (level, row). Masked slots are
    /// included; row-structured algorithms check validity per slot.
    pub fn iter_row(&self) -> BatchIter<'_, Ix> {
        BatchIter {
            grid: self,
            next_batch: 0,
            batches: self.rows.0 * self.levels.0,
        }
    }

    /// Every open passage, one `(a, b)` pair per link.
    pub fn iter_links(&self) -> LinksIter<'_, Ix> {
        LinksIter {
            grid: self,
            edges: self.graph.raw_edges().iter(),
        }
    }

    /// Deactivate cells outside the shape's normalized-space predicate,
    /// severing any links they hold.
    pub fn mask_shape(&mut self, shape: Shape) {
        let mut removed = 0usize;
        for index in 0..self.size() {
            if !self.active.contains(index) {
                continue;
            }
            let coord = self.coordinate_from_index(index);
            let (x, y) = self.topology.unit_point(coord, self.rows, self.columns);
            if !shape.contains(x, y) {
                self.deactivate(coord);
                removed += 1;
            }
        }
        debug!(shape = shape.name(), removed, remaining = self.active_cells_count(), "shape mask applied");
    }

    /// Deactivate cells a binary image mask turns off. The planar mask
    /// footprint applies to every level.
    pub fn mask_image(&mut self, mask: &BinaryMask2D) {
        let mut removed = 0usize;
        for index in 0..self.size() {
            if !self.active.contains(index) {
                continue;
            }
            let coord = self.coordinate_from_index(index);
            if mask.is_masked(coord) {
                self.deactivate(coord);
                removed += 1;
            }
        }
        debug!(removed, remaining = self.active_cells_count(), "image mask applied");
    }

    /// Remove a cell from the grid: sever all of its passages first so no
    /// active cell is ever left linked to an inactive one.
    pub fn deactivate(&mut self, coord: GridCoordinate) {
        if let Some(index) = self.active_index(coord) {
            if let Some(links) = self.links(coord) {
                for linked in links {
                    self.unlink(coord, linked);
                }
            }
            self.active.remove(index);
        }
    }

    /// Dead-end culling: for each dead end, with probability `p`, open one
    /// extra passage to an unlinked neighbour, preferring neighbours that are
    /// themselves dead ends. Creates loops for multi-path mazes.
    ///
    /// Returns the number of passages added. Dead-end status is re-checked at
    /// application time: an earlier braid may already have resolved this one.
    pub fn braid(&mut self, p: f64, rng: &mut XorShiftRng) -> usize {
        if p <= 0.0 {
            return 0;
        }
        let mut dead_ends: Vec<GridCoordinate> = self.iter().filter(|&c| self.is_dead_end(c)).collect();
        // Visit in a random order so the "prefer another dead end" rule does
        // not always favour low coordinates.
        dead_ends.shuffle(rng);

        let mut added = 0usize;
        for coord in dead_ends {
            if !self.is_dead_end(coord) {
                continue;
            }
            if p < 1.0 && rng.gen::<f64>() >= p {
                continue;
            }
            let links = self.links(coord).unwrap_or_default();
            let unlinked: CoordinateSmallVec = self.neighbours(coord)
                .iter()
                .cloned()
                .filter(|n| !links.contains(n))
                .collect();
            if unlinked.is_empty() {
                continue;
            }
            let preferred: CoordinateSmallVec =
                unlinked.iter().cloned().filter(|&n| self.is_dead_end(n)).collect();
            let candidates = if preferred.is_empty() { &unlinked } else { &preferred };
            if let Some(&choice) = candidates.choose(rng) {
                if self.link(coord, choice).is_ok() {
                    added += 1;
                }
            }
        }
        debug!(added, "braided dead ends");
        added
    }

    #[inline]
    fn slot_index(&self, coord: GridCoordinate) -> Option<usize> {
        if (coord.row as usize) < self.rows.0 && (coord.column as usize) < self.columns.0 &&
           (coord.level as usize) < self.levels.0 {
            let area = self.rows.0 * self.columns.0;
            Some(coord.level as usize * area + coord.row as usize * self.columns.0 + coord.column as usize)
        } else {
            None
        }
    }

    #[inline]
    fn active_index(&self, coord: GridCoordinate) -> Option<usize> {
        self.slot_index(coord).filter(|&index| self.active.contains(index))
    }
}

fn graph_size(rows: RowsCount, columns: ColumnsCount, levels: LevelsCount) -> (NodesCount, EdgesCount) {
    let nodes = rows.0 * columns.0 * levels.0;
    // Planar degree is at most 6 (hex); halve for undirected double counting
    // and add the vertical edges.
    let edges_hint = nodes * 3 + nodes.saturating_sub(rows.0 * columns.0);
    (NodesCount(nodes), EdgesCount(edges_hint))
}

pub struct CellIter<'a, Ix: IndexType> {
    grid: &'a Grid<Ix>,
    next_index: usize,
    capacity: usize,
}

impl<'a, Ix: IndexType> Iterator for CellIter<'a, Ix> {
    type Item = GridCoordinate;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < self.capacity {
            let index = self.next_index;
            self.next_index += 1;
            if self.grid.active.contains(index) {
                return Some(self.grid.coordinate_from_index(index));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.capacity - self.next_index))
    }
}

pub struct BatchIter<'a, Ix: IndexType> {
    grid: &'a Grid<Ix>,
    next_batch: usize,
    batches: usize,
}

impl<'a, Ix: IndexType> Iterator for BatchIter<'a, Ix> {
    type Item = Vec<GridCoordinate>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_batch >= self.batches {
            return None;
        }
        let rows = self.grid.rows.0;
        let level = (self.next_batch / rows) as u32;
        let row = (self.next_batch % rows) as u32;
        self.next_batch += 1;
        Some((0..self.grid.columns.0)
                 .map(|column| GridCoordinate::new(row, column as u32, level))
                 .collect())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.batches - self.next_batch;
        (remaining, Some(remaining))
    }
}

impl<'a, Ix: IndexType> ExactSizeIterator for BatchIter<'a, Ix> {}

pub struct LinksIter<'a, Ix: IndexType> {
    grid: &'a Grid<Ix>,
    edges: slice::Iter<'a, graph::Edge<(), Ix>>,
}

impl<'a, Ix: IndexType> Iterator for LinksIter<'a, Ix> {
    type Item = (GridCoordinate, GridCoordinate);

    fn next(&mut self) -> Option<Self::Item> {
        self.edges.next().map(|edge| {
            (self.grid.coordinate_from_index(edge.source().index()),
             self.grid.coordinate_from_index(edge.target().index()))
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.edges.size_hint()
    }
}

impl<'a, Ix: IndexType> ExactSizeIterator for LinksIter<'a, Ix> {}

#[cfg(test)]
mod tests {

    use itertools::Itertools;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    use super::*;
    use crate::masks::Shape;

    fn rect(rows: usize, columns: usize) -> Grid<u32> {
        Grid::new(Topology::Rect, RowsCount(rows), ColumnsCount(columns), LevelsCount(1))
    }

    fn gc(row: u32, column: u32) -> GridCoordinate {
        GridCoordinate::new(row, column, 0)
    }

    fn rng() -> XorShiftRng {
        XorShiftRng::seed_from_u64(0xfeed)
    }

    #[test]
    fn square_corner_has_two_neighbours() {
        let g = rect(3, 3);
        assert_eq!(g.neighbours(gc(0, 0)).len(), 2);
        assert_eq!(g.neighbours(gc(1, 1)).len(), 4);
    }

    #[test]
    fn hex_centre_has_six_neighbours() {
        let g: Grid<u32> = Grid::new(Topology::Hex, RowsCount(3), ColumnsCount(3), LevelsCount(1));
        assert_eq!(g.neighbours(gc(1, 1)).len(), 6);
    }

    #[test]
    fn polar_ring_one_wraps_around() {
        let g: Grid<u32> = Grid::new(Topology::Polar, RowsCount(3), ColumnsCount(8), LevelsCount(1));
        let neighbours = g.neighbours(gc(1, 0));
        assert_eq!(neighbours.len(), 4);
        assert!(neighbours.contains(&gc(1, 7)));
    }

    #[test]
    fn vertical_neighbours_join_levels() {
        let g: Grid<u32> = Grid::new(Topology::Rect, RowsCount(3), ColumnsCount(3), LevelsCount(3));
        let mid = GridCoordinate::new(1, 1, 1);
        let neighbours = g.neighbours(mid);
        assert_eq!(neighbours.len(), 6);
        assert!(neighbours.contains(&GridCoordinate::new(1, 1, 0)));
        assert!(neighbours.contains(&GridCoordinate::new(1, 1, 2)));

        let ground = GridCoordinate::new(1, 1, 0);
        assert_eq!(g.neighbours(ground).len(), 5);
    }

    #[test]
    fn linking_is_symmetric_and_reversible() {
        let mut g = rect(4, 4);
        let (a, b) = (gc(0, 1), gc(0, 2));

        assert!(!g.is_linked(a, b));
        g.link(a, b).expect("link failed");
        assert!(g.is_linked(a, b) && g.is_linked(b, a));
        assert_eq!(g.links(a).unwrap().iter().cloned().sorted().collect::<Vec<_>>(), vec![b]);
        assert_eq!(g.links(b).unwrap().iter().cloned().sorted().collect::<Vec<_>>(), vec![a]);

        // Re-linking does not duplicate the passage.
        g.link(b, a).expect("relink failed");
        assert_eq!(g.links_count(), 1);

        assert!(g.unlink(a, b));
        assert!(!g.is_linked(a, b));
        assert!(!g.unlink(a, b));
        assert_eq!(g.links_count(), 0);
    }

    #[test]
    fn bad_links_are_rejected() {
        let mut g = rect(4, 4);
        assert_eq!(g.link(gc(0, 0), gc(0, 0)), Err(CellLinkError::SelfLink));
        assert_eq!(g.link(gc(0, 0), gc(9, 9)), Err(CellLinkError::InvalidGridCoordinate));
        assert_eq!(g.link(gc(0, 0), gc(2, 2)), Err(CellLinkError::NotNeighbours));
    }

    #[test]
    fn get_cell_hides_masked_cells() {
        let mut g = rect(3, 3);
        assert!(g.get_cell(RowIndex(0), ColumnIndex(0), LevelIndex(0)).is_some());
        g.deactivate(gc(0, 0));
        assert!(g.get_cell(RowIndex(0), ColumnIndex(0), LevelIndex(0)).is_none());
        assert!(g.get_cell(RowIndex(3), ColumnIndex(0), LevelIndex(0)).is_none());
        assert_eq!(g.active_cells_count(), 8);
    }

    #[test]
    fn deactivation_severs_links() {
        let mut g = rect(3, 3);
        g.link(gc(0, 0), gc(0, 1)).unwrap();
        g.link(gc(0, 1), gc(0, 2)).unwrap();
        g.deactivate(gc(0, 1));

        assert_eq!(g.links_count(), 0);
        assert!(g.links(gc(0, 0)).unwrap().is_empty());
        // The survivor no longer sees the masked cell as a neighbour either.
        assert!(!g.neighbours(gc(0, 0)).contains(&gc(0, 1)));
    }

    #[test]
    fn circle_mask_removes_corners_and_preserves_the_invariant() {
        let mut g = rect(9, 9);
        g.mask_shape(Shape::Circle);
        assert!(!g.is_valid_coordinate(gc(0, 0)));
        assert!(g.is_valid_coordinate(gc(4, 4)));
        for cell in g.iter() {
            for linked in g.links(cell).unwrap() {
                assert!(g.is_valid_coordinate(linked));
            }
        }
    }

    #[test]
    fn random_cell_respects_masking() {
        let mut g = rect(5, 5);
        g.mask_shape(Shape::Circle);
        let mut rng = rng();
        for _ in 0..200 {
            let cell = g.random_cell(&mut rng).expect("grid has active cells");
            assert!(g.is_valid_coordinate(cell));
        }
    }

    #[test]
    fn fully_masked_grid_yields_nothing() {
        let mut g = rect(3, 3);
        for index in 0..g.size() {
            let coord = g.coordinate_from_index(index);
            g.deactivate(coord);
        }
        assert_eq!(g.active_cells_count(), 0);
        assert_eq!(g.iter().count(), 0);
        assert!(g.random_cell(&mut rng()).is_none());
    }

    #[test]
    fn braid_resolves_dead_ends() {
        let mut g = rect(3, 3);
        // One corridor along the top row: two dead ends.
        g.link(gc(0, 0), gc(0, 1)).unwrap();
        g.link(gc(0, 1), gc(0, 2)).unwrap();
        assert!(g.is_dead_end(gc(0, 0)));
        assert!(g.is_dead_end(gc(0, 2)));

        let added = g.braid(1.0, &mut rng());
        assert!(added >= 1);
        assert!(!g.is_dead_end(gc(0, 0)) || !g.is_dead_end(gc(0, 2)));
        for (a, b) in g.iter_links() {
            assert!(g.is_linked(a, b) && g.is_linked(b, a));
        }
    }

    #[test]
    fn braid_probability_zero_is_a_no_op() {
        let mut g = rect(3, 3);
        g.link(gc(0, 0), gc(0, 1)).unwrap();
        assert_eq!(g.braid(0.0, &mut rng()), 0);
        assert_eq!(g.links_count(), 1);
    }

    #[test]
    fn degenerate_grid_is_empty() {
        let g: Grid<u32> = Grid::new(Topology::Rect, RowsCount(0), ColumnsCount(4), LevelsCount(1));
        assert_eq!(g.size(), 0);
        assert_eq!(g.iter().count(), 0);
        assert_eq!(g.iter_row().count(), 0);
        assert!(g.random_cell(&mut rng()).is_none());
    }

    #[test]
    fn iteration_orders_cells_level_major() {
        let g: Grid<u32> = Grid::new(Topology::Rect, RowsCount(2), ColumnsCount(2), LevelsCount(2));
        let cells: Vec<GridCoordinate> = g.iter().collect();
        assert_eq!(cells.len(), 8);
        assert_eq!(cells[0], GridCoordinate::new(0, 0, 0));
        assert_eq!(cells[3], GridCoordinate::new(1, 1, 0));
        assert_eq!(cells[4], GridCoordinate::new(0, 0, 1));
        assert!(cells.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn row_batches_cover_each_level() {
        let g: Grid<u32> = Grid::new(Topology::Rect, RowsCount(2), ColumnsCount(3), LevelsCount(2));
        let batches: Vec<Vec<GridCoordinate>> = g.iter_row().collect();
        assert_eq!(batches.len(), 4);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[2][0], GridCoordinate::new(0, 0, 1));
    }
}
