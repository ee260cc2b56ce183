use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt::{Debug, Display, LowerHex};
use std::iter;
use std::ops::Add;

use fnv::{FnvHashMap, FnvHashSet};
use num_traits::{Bounded, One, Unsigned, Zero};
use petgraph::graph::IndexType;
use smallvec::SmallVec;
use tracing::debug;

use crate::cells::GridCoordinate;
use crate::grid::Grid;

/// The lazy path sequence driving one solve run: each element is the best
/// known path to the most recently discovered cell, the last element the path
/// to the goal (or to the final cell expanded when the goal is unreachable).
pub type SolveSteps<'a> = Box<dyn Iterator<Item = Vec<GridCoordinate>> + 'a>;

/// The closed family of route finding strategies. All of them search the
/// link graph only - walls are simply absent edges.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Solver {
    /// FIFO frontier; the first path that dequeues the goal is shortest by
    /// edge count.
    Bfs,
    /// LIFO frontier; wanders, no shortest-path guarantee.
    Dfs,
    /// Best-first on g + h where h is Manhattan distance plus a heavy
    /// penalty per level difference, so routes prefer finishing a floor
    /// before taking the stairs.
    AStar,
}

impl Solver {
    pub const ALL: [Solver; 3] = [Solver::Bfs, Solver::Dfs, Solver::AStar];

    pub fn from_name(name: &str) -> Option<Solver> {
        match name {
            "bfs" => Some(Solver::Bfs),
            "dfs" => Some(Solver::Dfs),
            "astar" | "a-star" => Some(Solver::AStar),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Solver::Bfs => "bfs",
            Solver::Dfs => "dfs",
            Solver::AStar => "astar",
        }
    }

    /// Begin a solve as a lazy sequence of best-known paths. Abandoning the
    /// sequence at any point is safe; each call starts a fresh search.
    pub fn solve_step<'a, Ix: IndexType>(&self,
                                         grid: &'a Grid<Ix>,
                                         start: GridCoordinate,
                                         goal: GridCoordinate)
                                         -> SolveSteps<'a> {
        if !grid.is_valid_coordinate(start) {
            return Box::new(iter::empty());
        }
        match *self {
            Solver::Bfs => frontier_search(grid, start, goal, FrontierOrder::Fifo),
            Solver::Dfs => frontier_search(grid, start, goal, FrontierOrder::Lifo),
            Solver::AStar => a_star_search(grid, start, goal),
        }
    }

    /// Run the search to completion and return the final path: to the goal
    /// when reachable, otherwise to the last cell the search expanded. Empty
    /// when `start` is invalid.
    pub fn solve<Ix: IndexType>(&self,
                                grid: &Grid<Ix>,
                                start: GridCoordinate,
                                goal: GridCoordinate)
                                -> Vec<GridCoordinate> {
        let path = self.solve_step(grid, start, goal).last().unwrap_or_default();
        debug!(solver = self.name(), length = path.len(), "solve finished");
        path
    }
}

#[derive(Eq, PartialEq, Copy, Clone)]
enum FrontierOrder {
    Fifo,
    Lifo,
}

/// BFS and DFS differ only in which end of the frontier the next cell comes
/// from, so they share one stepping engine.
fn frontier_search<'a, Ix: IndexType>(grid: &'a Grid<Ix>,
                                      start: GridCoordinate,
                                      goal: GridCoordinate,
                                      order: FrontierOrder)
                                      -> SolveSteps<'a> {
    let mut frontier: VecDeque<GridCoordinate> = VecDeque::new();
    frontier.push_back(start);
    let mut came_from: FnvHashMap<GridCoordinate, GridCoordinate> = FnvHashMap::default();
    let mut discovered: FnvHashSet<GridCoordinate> = FnvHashSet::default();
    discovered.insert(start);
    let mut expanding: Option<GridCoordinate> = None;
    let mut links: SmallVec<[GridCoordinate; 8]> = SmallVec::new();
    let mut link_index = 0usize;
    let mut last_expanded = start;
    let mut done = false;

    Box::new(iter::from_fn(move || {
        if done {
            return None;
        }
        loop {
            if let Some(current) = expanding {
                while link_index < links.len() {
                    let neighbour = links[link_index];
                    link_index += 1;
                    if discovered.insert(neighbour) {
                        came_from.insert(neighbour, current);
                        frontier.push_back(neighbour);
                        return Some(reconstruct_path(&came_from, start, neighbour));
                    }
                }
                expanding = None;
            }

            let next = match order {
                FrontierOrder::Fifo => frontier.pop_front(),
                FrontierOrder::Lifo => frontier.pop_back(),
            };
            match next {
                Some(cell) => {
                    last_expanded = cell;
                    if cell == goal {
                        done = true;
                        return Some(reconstruct_path(&came_from, start, goal));
                    }
                    links = grid.links(cell).unwrap_or_default();
                    link_index = 0;
                    expanding = Some(cell);
                }
                None => {
                    // Frontier exhausted without reaching the goal: the best
                    // that exists is the path to wherever the search ended.
                    done = true;
                    return Some(reconstruct_path(&came_from, start, last_expanded));
                }
            }
        }
    }))
}

fn a_star_search<'a, Ix: IndexType>(grid: &'a Grid<Ix>,
                                    start: GridCoordinate,
                                    goal: GridCoordinate)
                                    -> SolveSteps<'a> {
    let mut open: BinaryHeap<Reverse<(u64, GridCoordinate)>> = BinaryHeap::new();
    open.push(Reverse((0, start)));
    let mut came_from: FnvHashMap<GridCoordinate, GridCoordinate> = FnvHashMap::default();
    let mut g_score: FnvHashMap<GridCoordinate, u64> = FnvHashMap::default();
    g_score.insert(start, 0);
    let mut expanding: Option<GridCoordinate> = None;
    let mut links: SmallVec<[GridCoordinate; 8]> = SmallVec::new();
    let mut link_index = 0usize;
    let mut last_expanded = start;
    let mut done = false;

    Box::new(iter::from_fn(move || {
        if done {
            return None;
        }
        loop {
            if let Some(current) = expanding {
                let current_g = g_score.get(&current).cloned().unwrap_or(u64::MAX - 1);
                while link_index < links.len() {
                    let neighbour = links[link_index];
                    link_index += 1;
                    let tentative = current_g + 1;
                    let improves = g_score.get(&neighbour).map_or(true, |&g| tentative < g);
                    if improves {
                        g_score.insert(neighbour, tentative);
                        came_from.insert(neighbour, current);
                        open.push(Reverse((tentative + heuristic(neighbour, goal), neighbour)));
                        return Some(reconstruct_path(&came_from, start, neighbour));
                    }
                }
                expanding = None;
            }

            match open.pop() {
                Some(Reverse((_, cell))) => {
                    last_expanded = cell;
                    if cell == goal {
                        done = true;
                        return Some(reconstruct_path(&came_from, start, goal));
                    }
                    links = grid.links(cell).unwrap_or_default();
                    link_index = 0;
                    expanding = Some(cell);
                }
                None => {
                    done = true;
                    return Some(reconstruct_path(&came_from, start, last_expanded));
                }
            }
        }
    }))
}

/// Manhattan distance over (row, column) with a 5x penalty per level of
/// separation: changing floors costs one edge but is treated as expensive so
/// routes exhaust a floor before using the stairs.
fn heuristic(from: GridCoordinate, to: GridCoordinate) -> u64 {
    let dr = u64::from(from.row.abs_diff(to.row));
    let dc = u64::from(from.column.abs_diff(to.column));
    let dl = u64::from(from.level.abs_diff(to.level));
    dr + dc + 5 * dl
}

/// Walk the came-from chain back from `target` to `start`, inclusive.
fn reconstruct_path(came_from: &FnvHashMap<GridCoordinate, GridCoordinate>,
                    start: GridCoordinate,
                    target: GridCoordinate)
                    -> Vec<GridCoordinate> {
    let mut path = vec![target];
    let mut current = target;
    while current != start {
        match came_from.get(&current) {
            Some(&previous) => {
                path.push(previous);
                current = previous;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

// Trait (hack) used purely as a generic type parameter alias because it looks
// ugly to type the bounds out each time.
pub trait MaxDistance
    : Zero + One + Bounded + Unsigned + Add + Debug + Clone + Copy + Display + LowerHex + Ord {
}
impl<T: Zero + One + Bounded + Unsigned + Add + Debug + Clone + Copy + Display + LowerHex + Ord> MaxDistance for T {}

/// Flood-fill distances from one start cell to everything reachable from it,
/// one step per link.
#[derive(Debug, Clone)]
pub struct Distances<MaxDistanceT = u32> {
    start_coordinate: GridCoordinate,
    distances: FnvHashMap<GridCoordinate, MaxDistanceT>,
    max_distance: MaxDistanceT,
}

impl<MaxDistanceT: MaxDistance> Distances<MaxDistanceT> {
    pub fn new<Ix: IndexType>(grid: &Grid<Ix>, start_coordinate: GridCoordinate) -> Option<Distances<MaxDistanceT>> {
        if !grid.is_valid_coordinate(start_coordinate) {
            return None;
        }

        // Every step costs one, so the first write to a cell is already its
        // shortest distance and the distances map doubles as the visited set.
        let mut max = Zero::zero();
        let mut distances: FnvHashMap<GridCoordinate, MaxDistanceT> = FnvHashMap::default();
        distances.insert(start_coordinate, Zero::zero());

        let mut frontier = vec![start_coordinate];
        while !frontier.is_empty() {
            let mut new_frontier = vec![];
            for cell in &frontier {
                let distance_to_cell: MaxDistanceT =
                    *distances.entry(*cell).or_insert_with(Bounded::max_value);
                if distance_to_cell > max {
                    max = distance_to_cell;
                }

                for link in grid.links(*cell).unwrap_or_default() {
                    let distance_to_link: MaxDistanceT =
                        *distances.entry(link).or_insert_with(Bounded::max_value);
                    if distance_to_link == Bounded::max_value() {
                        distances.insert(link, distance_to_cell + One::one());
                        new_frontier.push(link);
                    }
                }
            }
            frontier = new_frontier;
        }

        Some(Distances {
            start_coordinate,
            distances,
            max_distance: max,
        })
    }

    #[inline]
    pub fn start(&self) -> GridCoordinate {
        self.start_coordinate
    }

    #[inline]
    pub fn max(&self) -> MaxDistanceT {
        self.max_distance
    }

    #[inline]
    pub fn distance_from_start_to(&self, coord: GridCoordinate) -> Option<MaxDistanceT> {
        self.distances.get(&coord).cloned()
    }

    pub fn furthest_points_on_grid(&self) -> SmallVec<[GridCoordinate; 8]> {
        let furthest_distance = self.max();
        self.distances
            .iter()
            .filter(|&(_, distance)| *distance == furthest_distance)
            .map(|(coord, _)| *coord)
            .collect()
    }
}

/// Walk downhill through a distance field from `end_point` back to its start.
/// None when the end point is unreachable or the field is inconsistent.
pub fn shortest_path<Ix, MaxDistanceT>(grid: &Grid<Ix>,
                                       distances_from_start: &Distances<MaxDistanceT>,
                                       end_point: GridCoordinate)
                                       -> Option<Vec<GridCoordinate>>
    where Ix: IndexType,
          MaxDistanceT: MaxDistance
{
    distances_from_start.distance_from_start_to(end_point)?;

    let start = distances_from_start.start();
    let mut path = vec![end_point];
    let mut current = end_point;

    while current != start {
        let current_distance = distances_from_start.distance_from_start_to(current)?;

        let closer = grid.links(current)?
            .iter()
            .cloned()
            .filter_map(|link| {
                distances_from_start.distance_from_start_to(link).map(|d| (link, d))
            })
            .min_by_key(|&(link, d)| (d, link));

        match closer {
            Some((link, distance)) if distance < current_distance => {
                current = link;
                path.push(current);
            }
            // No linked neighbour is closer to the start: broken input.
            _ => return None,
        }
    }

    path.reverse();
    Some(path)
}

/// The longest shortest-path across the maze: flood from an arbitrary cell,
/// flood again from the furthest point found, then walk to its furthest
/// point. Exact on perfect mazes; an arbitrary long path once braiding adds
/// loops.
pub fn dijkstra_longest_path<Ix, MaxDistanceT>(grid: &Grid<Ix>) -> Option<Vec<GridCoordinate>>
    where Ix: IndexType,
          MaxDistanceT: MaxDistance
{
    let arbitrary_start = grid.iter().next()?;
    let first_distances = Distances::<MaxDistanceT>::new(grid, arbitrary_start)?;

    let path_start = *first_distances.furthest_points_on_grid().first()?;
    let distances_from_start = Distances::<MaxDistanceT>::new(grid, path_start)?;
    let path_end = *distances_from_start.furthest_points_on_grid().first()?;

    shortest_path(grid, &distances_from_start, path_end)
}
