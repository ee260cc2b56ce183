use std::collections::VecDeque;
use std::iter;

use fnv::FnvHashMap;
use fnv::FnvHashSet;
use itertools::Itertools;
use petgraph::graph::IndexType;
use petgraph::unionfind::UnionFind;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use tracing::debug;

use crate::cells::GridCoordinate;
use crate::grid::{CoordinateSmallVec, Grid};

/// One observable event from a stepping generator: a passage that was just
/// opened, or a marker for a non-passage event worth an animation frame
/// (recursive division emits one per completed wall).
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum GenerationStep {
    Passage(GridCoordinate, GridCoordinate),
    Marker,
}

/// The lazy event sequence driving one generation run. Dropping it part-way
/// through is always safe; the grid simply keeps the passages carved so far.
pub type GenerationSteps<'a> = Box<dyn Iterator<Item = GenerationStep> + 'a>;

/// The closed family of maze generation strategies.
///
/// Every algorithm operates purely through the grid's neighbour/link API and,
/// on a connected set of active cells, carves a spanning tree: `N - 1`
/// passages, no cycles. Each has a distinct structural bias described on the
/// variant.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Generator {
    /// Depth-first carving with an explicit stack. Long winding corridors.
    RecursiveBacktracker,
    /// Frontier expansion from a random seed. Short uniform branches.
    RandomizedPrims,
    /// Unbiased random walk; slow but uniform over all spanning trees.
    AldousBroder,
    /// Loop-erased random walks. Unbiased, faster than Aldous-Broder in the
    /// late game.
    Wilsons,
    /// Each cell links towards one fixed diagonal. Trivially fast, heavily
    /// biased.
    BinaryTree,
    /// Row runs closed out by a single northward passage. Biased along rows.
    Sidewinder,
    /// Starts fully open and recursively walls chambers off, leaving one
    /// passage per wall. Produces long straight walls.
    RecursiveDivision,
    /// Random walk that scans for a fresh start whenever it corners itself.
    HuntAndKill,
    /// Random edge order filtered through a union-find. Many short dead ends.
    Kruskals,
    /// Row-by-row set merging with vertical drops. Streams in O(row) memory.
    Ellers,
}

impl Generator {
    pub const ALL: [Generator; 10] = [Generator::RecursiveBacktracker,
                                      Generator::RandomizedPrims,
                                      Generator::AldousBroder,
                                      Generator::Wilsons,
                                      Generator::BinaryTree,
                                      Generator::Sidewinder,
                                      Generator::RecursiveDivision,
                                      Generator::HuntAndKill,
                                      Generator::Kruskals,
                                      Generator::Ellers];

    pub fn from_name(name: &str) -> Option<Generator> {
        match name {
            "recursive-backtracker" | "backtracker" => Some(Generator::RecursiveBacktracker),
            "prims" => Some(Generator::RandomizedPrims),
            "aldous-broder" => Some(Generator::AldousBroder),
            "wilsons" => Some(Generator::Wilsons),
            "binary-tree" | "binary" => Some(Generator::BinaryTree),
            "sidewinder" => Some(Generator::Sidewinder),
            "recursive-division" | "division" => Some(Generator::RecursiveDivision),
            "hunt-and-kill" | "hunt-kill" => Some(Generator::HuntAndKill),
            "kruskals" => Some(Generator::Kruskals),
            "ellers" => Some(Generator::Ellers),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Generator::RecursiveBacktracker => "recursive-backtracker",
            Generator::RandomizedPrims => "prims",
            Generator::AldousBroder => "aldous-broder",
            Generator::Wilsons => "wilsons",
            Generator::BinaryTree => "binary-tree",
            Generator::Sidewinder => "sidewinder",
            Generator::RecursiveDivision => "recursive-division",
            Generator::HuntAndKill => "hunt-and-kill",
            Generator::Kruskals => "kruskals",
            Generator::Ellers => "ellers",
        }
    }

    /// Begin a generation run as a lazy event sequence for an animation
    /// driver to consume at its own pace. Each call starts a fresh run.
    pub fn generate_step<'a, Ix: IndexType>(&self, grid: &'a mut Grid<Ix>) -> GenerationSteps<'a> {
        self.generate_step_with_rng(grid, XorShiftRng::from_entropy())
    }

    pub fn generate_step_with_rng<'a, Ix: IndexType>(&self,
                                                     grid: &'a mut Grid<Ix>,
                                                     rng: XorShiftRng)
                                                     -> GenerationSteps<'a> {
        if grid.active_cells_count() == 0 {
            return Box::new(iter::empty());
        }
        match *self {
            Generator::RecursiveBacktracker => recursive_backtracker(grid, rng),
            Generator::RandomizedPrims => randomized_prims(grid, rng),
            Generator::AldousBroder => aldous_broder(grid, rng),
            Generator::Wilsons => wilsons(grid, rng),
            Generator::BinaryTree => binary_tree(grid, rng),
            Generator::Sidewinder => sidewinder(grid, rng),
            Generator::RecursiveDivision => recursive_division(grid, rng),
            Generator::HuntAndKill => hunt_and_kill(grid, rng),
            Generator::Kruskals => kruskals(grid, rng),
            Generator::Ellers => ellers(grid, rng),
        }
    }

    /// Run a whole generation in one call.
    pub fn generate<Ix: IndexType>(&self, grid: &mut Grid<Ix>) {
        self.generate_with_rng(grid, XorShiftRng::from_entropy());
    }

    pub fn generate_with_rng<Ix: IndexType>(&self, grid: &mut Grid<Ix>, rng: XorShiftRng) {
        for _ in self.generate_step_with_rng(grid, rng) {}
        debug!(generator = self.name(), links = grid.links_count(), "generation finished");
    }
}

fn recursive_backtracker<'a, Ix: IndexType>(grid: &'a mut Grid<Ix>,
                                            mut rng: XorShiftRng)
                                            -> GenerationSteps<'a> {
    let mut visited: FnvHashSet<GridCoordinate> = FnvHashSet::default();
    let mut stack: Vec<GridCoordinate> = Vec::new();
    if let Some(start) = grid.random_cell(&mut rng) {
        visited.insert(start);
        stack.push(start);
    }

    Box::new(iter::from_fn(move || {
        while let Some(&current) = stack.last() {
            let unvisited: CoordinateSmallVec = grid.neighbours(current)
                .iter()
                .cloned()
                .filter(|n| !visited.contains(n))
                .collect();
            if let Some(&next) = unvisited.choose(&mut rng) {
                let _ = grid.link(current, next);
                visited.insert(next);
                stack.push(next);
                return Some(GenerationStep::Passage(current, next));
            }
            stack.pop();
        }
        None
    }))
}

fn randomized_prims<'a, Ix: IndexType>(grid: &'a mut Grid<Ix>,
                                       mut rng: XorShiftRng)
                                       -> GenerationSteps<'a> {
    let mut visited: FnvHashSet<GridCoordinate> = FnvHashSet::default();
    let mut frontier: Vec<GridCoordinate> = Vec::new();
    let mut queued: FnvHashSet<GridCoordinate> = FnvHashSet::default();
    if let Some(start) = grid.random_cell(&mut rng) {
        visited.insert(start);
        for n in grid.neighbours(start) {
            if queued.insert(n) {
                frontier.push(n);
            }
        }
    }

    Box::new(iter::from_fn(move || {
        while !frontier.is_empty() {
            let pick = rng.gen_range(0..frontier.len());
            let cell = frontier.swap_remove(pick);
            queued.remove(&cell);
            if visited.contains(&cell) {
                continue;
            }
            let in_maze: CoordinateSmallVec = grid.neighbours(cell)
                .iter()
                .cloned()
                .filter(|n| visited.contains(n))
                .collect();
            if let Some(&attach) = in_maze.choose(&mut rng) {
                let _ = grid.link(cell, attach);
                visited.insert(cell);
                for n in grid.neighbours(cell) {
                    if !visited.contains(&n) && queued.insert(n) {
                        frontier.push(n);
                    }
                }
                return Some(GenerationStep::Passage(attach, cell));
            }
        }
        None
    }))
}

fn aldous_broder<'a, Ix: IndexType>(grid: &'a mut Grid<Ix>,
                                    mut rng: XorShiftRng)
                                    -> GenerationSteps<'a> {
    let start = match grid.random_cell(&mut rng) {
        Some(cell) => cell,
        None => return Box::new(iter::empty()),
    };
    // The walk can only ever reach the start's connected component, so the
    // unvisited countdown must not include cells masking has cut off.
    let mut remaining = component_size(grid, start).saturating_sub(1);
    let mut visited: FnvHashSet<GridCoordinate> = FnvHashSet::default();
    visited.insert(start);
    let mut current = start;

    Box::new(iter::from_fn(move || {
        while remaining > 0 {
            let neighbours = grid.neighbours(current);
            let next = match neighbours.choose(&mut rng) {
                Some(&n) => n,
                None => return None,
            };
            if visited.insert(next) {
                let _ = grid.link(current, next);
                remaining -= 1;
                let from = current;
                current = next;
                return Some(GenerationStep::Passage(from, next));
            }
            current = next;
        }
        None
    }))
}

fn wilsons<'a, Ix: IndexType>(grid: &'a mut Grid<Ix>, mut rng: XorShiftRng) -> GenerationSteps<'a> {
    // Seed one visited cell per connected component so every loop-erased walk
    // has a reachable terminal and the run ends even on masked, fragmented
    // grids.
    let seeds = component_seeds(grid);
    let mut visited: FnvHashSet<GridCoordinate> = seeds.into_iter().collect();
    let mut unvisited: Vec<GridCoordinate> = grid.iter().filter(|c| !visited.contains(c)).collect();
    let mut pending: VecDeque<(GridCoordinate, GridCoordinate)> = VecDeque::new();

    Box::new(iter::from_fn(move || {
        loop {
            if let Some((a, b)) = pending.pop_front() {
                let _ = grid.link(a, b);
                return Some(GenerationStep::Passage(a, b));
            }
            if unvisited.is_empty() {
                return None;
            }

            let start = unvisited[rng.gen_range(0..unvisited.len())];
            let mut walk: Vec<GridCoordinate> = vec![start];
            let mut walk_pos: FnvHashMap<GridCoordinate, usize> = FnvHashMap::default();
            walk_pos.insert(start, 0);
            let mut cell = start;

            while !visited.contains(&cell) {
                let neighbours = grid.neighbours(cell);
                let next = match neighbours.choose(&mut rng) {
                    Some(&n) => n,
                    None => break,
                };
                if let Some(&pos) = walk_pos.get(&next) {
                    // Stepped back onto the walk: erase the loop.
                    for trimmed in walk.drain(pos + 1..) {
                        walk_pos.remove(&trimmed);
                    }
                } else {
                    walk_pos.insert(next, walk.len());
                    walk.push(next);
                }
                cell = next;
            }

            for window in 0..walk.len().saturating_sub(1) {
                visited.insert(walk[window]);
                pending.push_back((walk[window], walk[window + 1]));
            }
            if walk.len() == 1 {
                // Walk never left an isolated cell; count it done.
                visited.insert(start);
            }
            unvisited.retain(|c| !visited.contains(c));
        }
    }))
}

fn binary_tree<'a, Ix: IndexType>(grid: &'a mut Grid<Ix>, mut rng: XorShiftRng) -> GenerationSteps<'a> {
    let cells: Vec<GridCoordinate> = grid.iter().collect();
    let mut next_cell = 0usize;

    Box::new(iter::from_fn(move || {
        while next_cell < cells.len() {
            let cell = cells[next_cell];
            next_cell += 1;

            let neighbours = grid.neighbours(cell);
            let planar: CoordinateSmallVec = neighbours
                .iter()
                .cloned()
                .filter(|n| {
                    n.level == cell.level &&
                    (n.row < cell.row || (n.row == cell.row && n.column > cell.column))
                })
                .collect();
            let candidates: CoordinateSmallVec = if planar.is_empty() {
                // No north-or-east-ish neighbour: take the stairs up instead,
                // which is also what stitches the levels together.
                neighbours.iter().cloned().filter(|n| n.level > cell.level).collect()
            } else {
                planar
            };

            if let Some(&pick) = candidates.choose(&mut rng) {
                let _ = grid.link(cell, pick);
                return Some(GenerationStep::Passage(cell, pick));
            }
        }
        None
    }))
}

fn sidewinder<'a, Ix: IndexType>(grid: &'a mut Grid<Ix>, mut rng: XorShiftRng) -> GenerationSteps<'a> {
    let rows: Vec<Vec<GridCoordinate>> = grid.iter_row().collect();
    let mut row_index = 0usize;
    let mut column_index = 0usize;
    let mut run: Vec<GridCoordinate> = Vec::new();

    Box::new(iter::from_fn(move || {
        while row_index < rows.len() {
            if column_index >= rows[row_index].len() {
                row_index += 1;
                column_index = 0;
                run.clear();
                continue;
            }
            let cell = rows[row_index][column_index];
            column_index += 1;

            if !grid.is_valid_coordinate(cell) {
                // A masked slot breaks the current run.
                run.clear();
                continue;
            }
            run.push(cell);

            let at_east_boundary = grid.offset(cell, 0, 1, 0).is_none();
            let at_north_boundary = grid.offset(cell, -1, 0, 0).is_none();
            let should_close = at_east_boundary || (!at_north_boundary && rng.gen::<bool>());

            if should_close {
                let member = match run.choose(&mut rng) {
                    Some(&m) => m,
                    None => continue,
                };
                run.clear();
                if let Some(north) = grid.offset(member, -1, 0, 0) {
                    let _ = grid.link(member, north);
                    return Some(GenerationStep::Passage(member, north));
                }
                if let Some(above) = grid.offset(member, 0, 0, 1) {
                    // Boundary rows close out into the level above.
                    let _ = grid.link(member, above);
                    return Some(GenerationStep::Passage(member, above));
                }
            } else if let Some(east) = grid.offset(cell, 0, 1, 0) {
                let _ = grid.link(cell, east);
                return Some(GenerationStep::Passage(cell, east));
            }
        }
        None
    }))
}

fn recursive_division<'a, Ix: IndexType>(grid: &'a mut Grid<Ix>,
                                         mut rng: XorShiftRng)
                                         -> GenerationSteps<'a> {
    // Start from a fully open floor plan: every planar passage linked, plus
    // one staircase per level boundary.
    let cells: Vec<GridCoordinate> = grid.iter().collect();
    for &cell in &cells {
        let planar: CoordinateSmallVec = grid.neighbours(cell)
            .iter()
            .cloned()
            .filter(|n| n.level == cell.level && cell < *n)
            .collect();
        for n in planar {
            let _ = grid.link(cell, n);
        }
    }
    let levels = grid.levels().0;
    for level in 0..levels.saturating_sub(1) {
        let stairs: Vec<GridCoordinate> = cells
            .iter()
            .cloned()
            .filter(|c| c.level as usize == level && grid.offset(*c, 0, 0, 1).is_some())
            .collect();
        if let Some(&stair) = stairs.choose(&mut rng) {
            if let Some(above) = grid.offset(stair, 0, 0, 1) {
                let _ = grid.link(stair, above);
            }
        }
    }

    // Explicit chamber work-stack instead of recursion, so the sequence can
    // be suspended between divisions.
    let mut chambers: Vec<(usize, usize, usize, usize, usize)> =
        (0..levels).map(|level| (0, 0, grid.rows().0, grid.columns().0, level)).collect();

    Box::new(iter::from_fn(move || {
        while let Some((row0, col0, height, width, level)) = chambers.pop() {
            if height <= 1 || width <= 1 {
                continue;
            }
            let horizontal = if height != width { rng.gen::<bool>() } else { height > width };

            if horizontal {
                let wall_row = rng.gen_range(row0..=row0 + height - 2);
                let passage_col = rng.gen_range(col0..col0 + width);
                for col in col0..col0 + width {
                    if col == passage_col {
                        continue;
                    }
                    let cell = GridCoordinate::new(wall_row as u32, col as u32, level as u32);
                    if grid.is_valid_coordinate(cell) {
                        if let Some(south) = grid.offset(cell, 1, 0, 0) {
                            grid.unlink(cell, south);
                        }
                    }
                }
                chambers.push((row0, col0, wall_row - row0 + 1, width, level));
                chambers.push((wall_row + 1, col0, row0 + height - wall_row - 1, width, level));
            } else {
                let wall_col = rng.gen_range(col0..=col0 + width - 2);
                let passage_row = rng.gen_range(row0..row0 + height);
                for row in row0..row0 + height {
                    if row == passage_row {
                        continue;
                    }
                    let cell = GridCoordinate::new(row as u32, wall_col as u32, level as u32);
                    if grid.is_valid_coordinate(cell) {
                        if let Some(east) = grid.offset(cell, 0, 1, 0) {
                            grid.unlink(cell, east);
                        }
                    }
                }
                chambers.push((row0, col0, height, wall_col - col0 + 1, level));
                chambers.push((row0, wall_col + 1, height, col0 + width - wall_col - 1, level));
            }
            return Some(GenerationStep::Marker);
        }
        None
    }))
}

fn hunt_and_kill<'a, Ix: IndexType>(grid: &'a mut Grid<Ix>, mut rng: XorShiftRng) -> GenerationSteps<'a> {
    let cells: Vec<GridCoordinate> = grid.iter().collect();
    let mut visited: FnvHashSet<GridCoordinate> = FnvHashSet::default();
    let mut remaining = cells.len();
    let mut current: Option<GridCoordinate> = grid.random_cell(&mut rng);
    if let Some(start) = current {
        visited.insert(start);
        remaining -= 1;
    }

    Box::new(iter::from_fn(move || {
        loop {
            if let Some(walker) = current {
                let unvisited: CoordinateSmallVec = grid.neighbours(walker)
                    .iter()
                    .cloned()
                    .filter(|n| !visited.contains(n))
                    .collect();
                if let Some(&next) = unvisited.choose(&mut rng) {
                    let _ = grid.link(walker, next);
                    visited.insert(next);
                    remaining -= 1;
                    current = Some(next);
                    return Some(GenerationStep::Passage(walker, next));
                }
                // Cornered: go hunting.
                current = None;
            }

            if remaining == 0 {
                return None;
            }

            // Hunt: first unvisited cell, in stable scan order, adjacent to
            // the maze so far.
            let mut huntable: Option<(GridCoordinate, CoordinateSmallVec)> = None;
            for &cell in &cells {
                if visited.contains(&cell) {
                    continue;
                }
                let seen_neighbours: CoordinateSmallVec = grid.neighbours(cell)
                    .iter()
                    .cloned()
                    .filter(|n| visited.contains(n))
                    .collect();
                if !seen_neighbours.is_empty() {
                    huntable = Some((cell, seen_neighbours));
                    break;
                }
            }

            if let Some((cell, seen_neighbours)) = huntable {
                if let Some(&attach) = seen_neighbours.choose(&mut rng) {
                    let _ = grid.link(attach, cell);
                    visited.insert(cell);
                    remaining -= 1;
                    current = Some(cell);
                    return Some(GenerationStep::Passage(attach, cell));
                }
            }

            // No unvisited cell borders the maze: the rest of the grid is in
            // other components. Restart the walk in one of them.
            let restart = cells.iter().find(|c| !visited.contains(*c)).cloned();
            match restart {
                Some(cell) => {
                    visited.insert(cell);
                    remaining -= 1;
                    current = Some(cell);
                    return Some(GenerationStep::Marker);
                }
                None => return None,
            }
        }
    }))
}

fn kruskals<'a, Ix: IndexType>(grid: &'a mut Grid<Ix>, mut rng: XorShiftRng) -> GenerationSteps<'a> {
    // Every candidate edge exactly once, canonicalised by the coordinate
    // total order, then visited in a random order.
    let mut edges: Vec<(GridCoordinate, GridCoordinate)> = Vec::new();
    for cell in grid.iter() {
        for n in grid.neighbours(cell) {
            if cell < n {
                edges.push((cell, n));
            }
        }
    }
    edges.shuffle(&mut rng);
    let mut sets: UnionFind<u32> = UnionFind::new(grid.size());

    Box::new(iter::from_fn(move || {
        while let Some((a, b)) = edges.pop() {
            let (a_index, b_index) = match (grid.grid_coordinate_to_index(a),
                                            grid.grid_coordinate_to_index(b)) {
                (Some(ai), Some(bi)) => (ai, bi),
                _ => continue,
            };
            if sets.union(a_index as u32, b_index as u32) {
                let _ = grid.link(a, b);
                return Some(GenerationStep::Passage(a, b));
            }
        }
        None
    }))
}

fn ellers<'a, Ix: IndexType>(grid: &'a mut Grid<Ix>, mut rng: XorShiftRng) -> GenerationSteps<'a> {
    let rows = grid.rows().0;
    let columns = grid.columns().0;
    let levels = grid.levels().0;

    let mut pending: VecDeque<(GridCoordinate, GridCoordinate)> = VecDeque::new();
    let mut carried_sets: FnvHashMap<u32, usize> = FnvHashMap::default();
    let mut next_set_id = 0usize;
    let mut level = 0usize;
    let mut row = 0usize;
    let mut finished = rows == 0 || columns == 0 || levels == 0;

    Box::new(iter::from_fn(move || {
        loop {
            if let Some((a, b)) = pending.pop_front() {
                let _ = grid.link(a, b);
                return Some(GenerationStep::Passage(a, b));
            }
            if finished {
                return None;
            }

            let (lvl, r) = (level as u32, row as u32);
            let last_row = row + 1 == rows;

            // Sets carried down from the previous row, topped up with fresh
            // singletons for cells without one.
            let mut row_sets = std::mem::take(&mut carried_sets);
            for col in 0..columns as u32 {
                let coord = GridCoordinate::new(r, col, lvl);
                if grid.is_valid_coordinate(coord) {
                    row_sets.entry(col).or_insert_with(|| {
                        next_set_id += 1;
                        next_set_id
                    });
                } else {
                    row_sets.remove(&col);
                }
            }

            // Probabilistic horizontal merges; the last row always merges so
            // the level ends connected.
            for col in 0..(columns as u32).saturating_sub(1) {
                let a = GridCoordinate::new(r, col, lvl);
                let b = GridCoordinate::new(r, col + 1, lvl);
                if !grid.is_valid_coordinate(a) || !grid.is_valid_coordinate(b) {
                    continue;
                }
                let (set_a, set_b) = match (row_sets.get(&col), row_sets.get(&(col + 1))) {
                    (Some(&sa), Some(&sb)) => (sa, sb),
                    _ => continue,
                };
                if set_a != set_b && (last_row || rng.gen::<bool>()) {
                    for set in row_sets.values_mut() {
                        if *set == set_b {
                            *set = set_a;
                        }
                    }
                    pending.push_back((a, b));
                }
            }

            // Vertical drops: every set sends at least one passage down.
            if !last_row {
                let members = row_sets
                    .iter()
                    .filter(|&(&col, _)| grid.is_valid_coordinate(GridCoordinate::new(r + 1, col, lvl)))
                    .map(|(&col, &set)| (set, col))
                    .into_group_map();
                for (set, mut columns_in_set) in members {
                    columns_in_set.sort_unstable();
                    let mut dropped = false;
                    for &col in &columns_in_set {
                        if rng.gen::<bool>() {
                            pending.push_back((GridCoordinate::new(r, col, lvl),
                                               GridCoordinate::new(r + 1, col, lvl)));
                            carried_sets.insert(col, set);
                            dropped = true;
                        }
                    }
                    if !dropped {
                        if let Some(&col) = columns_in_set.choose(&mut rng) {
                            pending.push_back((GridCoordinate::new(r, col, lvl),
                                               GridCoordinate::new(r + 1, col, lvl)));
                            carried_sets.insert(col, set);
                        }
                    }
                }
            }

            row += 1;
            if row == rows {
                if level + 1 < levels {
                    // A single staircase joins each finished level to the
                    // next.
                    let stairs: Vec<GridCoordinate> = grid.iter()
                        .filter(|c| c.level as usize == level && grid.offset(*c, 0, 0, 1).is_some())
                        .collect();
                    if let Some(&stair) = stairs.choose(&mut rng) {
                        if let Some(above) = grid.offset(stair, 0, 0, 1) {
                            pending.push_back((stair, above));
                        }
                    }
                }
                row = 0;
                level += 1;
                carried_sets.clear();
                if level == levels {
                    finished = true;
                }
            }
        }
    }))
}

/// Union-find over the geometric neighbour graph: which active cells can a
/// generator ever hope to join up?
fn neighbour_components<Ix: IndexType>(grid: &Grid<Ix>) -> UnionFind<u32> {
    let mut sets: UnionFind<u32> = UnionFind::new(grid.size());
    for cell in grid.iter() {
        if let Some(cell_index) = grid.grid_coordinate_to_index(cell) {
            for n in grid.neighbours(cell) {
                if let Some(n_index) = grid.grid_coordinate_to_index(n) {
                    sets.union(cell_index as u32, n_index as u32);
                }
            }
        }
    }
    sets
}

/// One arbitrary cell per connected component of active cells.
fn component_seeds<Ix: IndexType>(grid: &Grid<Ix>) -> Vec<GridCoordinate> {
    let sets = neighbour_components(grid);
    let mut seen_roots: FnvHashSet<u32> = FnvHashSet::default();
    let mut seeds = Vec::new();
    for cell in grid.iter() {
        if let Some(index) = grid.grid_coordinate_to_index(cell) {
            if seen_roots.insert(sets.find(index as u32)) {
                seeds.push(cell);
            }
        }
    }
    seeds
}

/// Number of active cells reachable from `start` through neighbour adjacency.
fn component_size<Ix: IndexType>(grid: &Grid<Ix>, start: GridCoordinate) -> usize {
    let sets = neighbour_components(grid);
    match grid.grid_coordinate_to_index(start) {
        Some(start_index) => {
            let root = sets.find(start_index as u32);
            grid.iter()
                .filter(|c| {
                    grid.grid_coordinate_to_index(*c)
                        .map_or(false, |i| sets.find(i as u32) == root)
                })
                .count()
        }
        None => 0,
    }
}

#[cfg(test)]
mod tests {

    use fnv::FnvHashSet;
    use quickcheck::{quickcheck, TestResult};
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    use super::*;
    use crate::cells::GridCoordinate;
    use crate::grid::Grid;
    use crate::masks::Shape;
    use crate::topologies::Topology;
    use crate::units::{ColumnsCount, LevelsCount, RowsCount};

    fn grid(topology: Topology, rows: usize, columns: usize, levels: usize) -> Grid<u32> {
        Grid::new(topology, RowsCount(rows), ColumnsCount(columns), LevelsCount(levels))
    }

    fn rng(seed: u64) -> XorShiftRng {
        XorShiftRng::seed_from_u64(seed)
    }

    fn reachable_from(grid: &Grid<u32>, start: GridCoordinate) -> usize {
        let mut seen: FnvHashSet<GridCoordinate> = FnvHashSet::default();
        seen.insert(start);
        let mut frontier = vec![start];
        while let Some(cell) = frontier.pop() {
            for n in grid.links(cell).unwrap_or_default() {
                if seen.insert(n) {
                    frontier.push(n);
                }
            }
        }
        seen.len()
    }

    fn assert_links_symmetric(grid: &Grid<u32>) {
        for (a, b) in grid.iter_links() {
            assert!(grid.is_linked(a, b) && grid.is_linked(b, a));
        }
    }

    #[test]
    fn every_generator_carves_a_spanning_tree_on_a_square_grid() {
        for (i, generator) in Generator::ALL.iter().enumerate() {
            let mut g = grid(Topology::Rect, 5, 5, 1);
            generator.generate_with_rng(&mut g, rng(100 + i as u64));
            assert_eq!(g.links_count(), 24, "{} link count", generator.name());
            let start = g.iter().next().expect("grid has cells");
            assert_eq!(reachable_from(&g, start), 25, "{} connectivity", generator.name());
            assert_links_symmetric(&g);
        }
    }

    #[test]
    fn hunt_and_kill_five_by_five_scenario() {
        let mut g = grid(Topology::Rect, 5, 5, 1);
        Generator::HuntAndKill.generate_with_rng(&mut g, rng(7));
        assert_eq!(g.links_count(), 24);
        for cell in g.iter() {
            assert_eq!(reachable_from(&g, cell), 25);
        }
    }

    #[test]
    fn kruskals_five_by_five_scenario() {
        let mut g = grid(Topology::Rect, 5, 5, 1);
        Generator::Kruskals.generate_with_rng(&mut g, rng(8));
        // n - 1 links over a connected graph means acyclic as well.
        assert_eq!(g.links_count(), 24);
        let start = g.iter().next().expect("grid has cells");
        assert_eq!(reachable_from(&g, start), 25);
    }

    #[test]
    fn every_generator_joins_multiple_levels() {
        for (i, generator) in Generator::ALL.iter().enumerate() {
            let mut g = grid(Topology::Rect, 3, 3, 2);
            generator.generate_with_rng(&mut g, rng(200 + i as u64));
            assert_eq!(g.links_count(), 17, "{} link count", generator.name());
            let start = g.iter().next().expect("grid has cells");
            assert_eq!(reachable_from(&g, start), 18, "{} connectivity", generator.name());
        }
    }

    #[test]
    fn graph_generators_span_other_topologies() {
        let mut hex = grid(Topology::Hex, 4, 4, 1);
        Generator::RecursiveBacktracker.generate_with_rng(&mut hex, rng(31));
        assert_eq!(hex.links_count(), 15);
        let start = hex.iter().next().expect("grid has cells");
        assert_eq!(reachable_from(&hex, start), 16);

        let mut polar = grid(Topology::Polar, 3, 8, 1);
        Generator::Kruskals.generate_with_rng(&mut polar, rng(32));
        assert_eq!(polar.links_count(), 23);
        let start = polar.iter().next().expect("grid has cells");
        assert_eq!(reachable_from(&polar, start), 24);
    }

    #[test]
    fn tree_generators_span_a_circle_masked_grid() {
        let tree_generators = [Generator::RecursiveBacktracker,
                               Generator::RandomizedPrims,
                               Generator::AldousBroder,
                               Generator::Wilsons,
                               Generator::HuntAndKill,
                               Generator::Kruskals];
        for (i, generator) in tree_generators.iter().enumerate() {
            let mut g = grid(Topology::Rect, 9, 9, 1);
            g.mask_shape(Shape::Circle);
            let active = g.active_cells_count();
            assert!(active < 81);
            generator.generate_with_rng(&mut g, rng(300 + i as u64));
            assert_eq!(g.links_count(), active - 1, "{} masked link count", generator.name());
            let start = g.iter().next().expect("grid has cells");
            assert_eq!(reachable_from(&g, start), active, "{} masked connectivity", generator.name());
        }
    }

    #[test]
    fn row_structured_generators_tolerate_masking() {
        let row_generators = [Generator::BinaryTree,
                              Generator::Sidewinder,
                              Generator::RecursiveDivision,
                              Generator::Ellers];
        for (i, generator) in row_generators.iter().enumerate() {
            let mut g = grid(Topology::Rect, 9, 9, 1);
            g.mask_shape(Shape::Circle);
            generator.generate_with_rng(&mut g, rng(400 + i as u64));
            assert_links_symmetric(&g);
            for cell in g.iter() {
                for linked in g.links(cell).unwrap_or_default() {
                    assert!(g.is_valid_coordinate(linked));
                }
            }
        }
    }

    #[test]
    fn component_spanning_generators_cover_disconnected_pieces() {
        for (i, generator) in [Generator::Wilsons, Generator::HuntAndKill, Generator::Kruskals]
            .iter()
            .enumerate() {
            let mut g = grid(Topology::Rect, 5, 5, 1);
            for row in 0..5u32 {
                g.deactivate(GridCoordinate::new(row, 2, 0));
            }
            assert_eq!(g.active_cells_count(), 20);
            generator.generate_with_rng(&mut g, rng(500 + i as u64));
            // Two components, each spanned by its own tree.
            assert_eq!(g.links_count(), 18, "{} split link count", generator.name());
            assert_eq!(reachable_from(&g, GridCoordinate::new(0, 0, 0)), 10);
            assert_eq!(reachable_from(&g, GridCoordinate::new(0, 3, 0)), 10);
        }
    }

    #[test]
    fn walk_generators_terminate_on_disconnected_grids() {
        for (i, generator) in [Generator::RecursiveBacktracker,
                               Generator::RandomizedPrims,
                               Generator::AldousBroder]
            .iter()
            .enumerate() {
            let mut g = grid(Topology::Rect, 5, 5, 1);
            for row in 0..5u32 {
                g.deactivate(GridCoordinate::new(row, 2, 0));
            }
            generator.generate_with_rng(&mut g, rng(600 + i as u64));
            // The start's component is fully carved; the other is untouched.
            assert_eq!(g.links_count(), 9, "{} spans one component", generator.name());
        }
    }

    #[test]
    fn empty_grid_yields_no_steps() {
        for generator in Generator::ALL {
            let mut g = grid(Topology::Rect, 3, 3, 1);
            for index in 0..g.size() {
                let coord = g.coordinate_from_index(index);
                g.deactivate(coord);
            }
            let mut steps = generator.generate_step_with_rng(&mut g, rng(1));
            assert!(steps.next().is_none(), "{} on an empty grid", generator.name());
        }
    }

    #[test]
    fn generation_steps_are_lazy() {
        let mut g = grid(Topology::Rect, 5, 5, 1);
        {
            let steps = Generator::RecursiveBacktracker.generate_step_with_rng(&mut g, rng(9));
            // Consume only a few events, then abandon the run.
            assert_eq!(steps.take(3).count(), 3);
        }
        assert_eq!(g.links_count(), 3);
    }

    #[test]
    fn passages_are_reported_as_they_are_carved() {
        let mut g = grid(Topology::Rect, 4, 4, 1);
        let mut expected_links = 0;
        let mut steps = Generator::Wilsons.generate_step_with_rng(&mut g, rng(10));
        while let Some(step) = steps.next() {
            if let GenerationStep::Passage(_, _) = step {
                expected_links += 1;
            }
        }
        drop(steps);
        assert_eq!(g.links_count(), expected_links);
    }

    #[test]
    fn quickcheck_spanning_trees() {
        fn prop(rows: u8, columns: u8, which: u8) -> TestResult {
            let (rows, columns) = ((rows % 6) as usize + 1, (columns % 6) as usize + 1);
            let generator = Generator::ALL[(which as usize) % Generator::ALL.len()];
            let mut g: Grid<u32> = Grid::new(Topology::Rect,
                                             RowsCount(rows),
                                             ColumnsCount(columns),
                                             LevelsCount(1));
            generator.generate_with_rng(&mut g, XorShiftRng::seed_from_u64(u64::from(which) + 1));
            TestResult::from_bool(g.links_count() == rows * columns - 1)
        }
        quickcheck(prop as fn(u8, u8, u8) -> TestResult);
    }
}
