use petgraph::graph::IndexType;

use crate::grid::Grid;
use crate::topologies::Topology;
use crate::units::{ColumnsCount, LevelsCount, RowsCount};

/// Grid sized for mazes whose cell count fits a 16 bit graph index.
pub type SmallGrid = Grid<u16>;
/// Grid sized for anything a 32 bit graph index can hold.
pub type LargeGrid = Grid<u32>;

pub fn small_grid(topology: Topology,
                  rows: RowsCount,
                  columns: ColumnsCount,
                  levels: LevelsCount)
                  -> Option<SmallGrid> {
    checked_grid(topology, rows, columns, levels)
}

pub fn large_grid(topology: Topology,
                  rows: RowsCount,
                  columns: ColumnsCount,
                  levels: LevelsCount)
                  -> Option<LargeGrid> {
    checked_grid(topology, rows, columns, levels)
}

/// None when the cell count cannot be represented by the graph index type
/// (the top index value is reserved by the graph as a sentinel).
fn checked_grid<Ix: IndexType>(topology: Topology,
                               rows: RowsCount,
                               columns: ColumnsCount,
                               levels: LevelsCount)
                               -> Option<Grid<Ix>> {
    let nodes = rows.0 * columns.0 * levels.0;
    if nodes < <Ix as IndexType>::max().index() {
        Some(Grid::new(topology, rows, columns, levels))
    } else {
        None
    }
}
