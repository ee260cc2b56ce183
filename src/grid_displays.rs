use std::fmt;

use fnv::FnvHashSet;
use petgraph::graph::IndexType;

use crate::cells::GridCoordinate;
use crate::grid::{CoordinateSmallVec, Grid};
use crate::pathing::{Distances, MaxDistance};

/// Renders the contents of a grid cell as text.
/// The String should be 3 glyphs long, padded if required.
pub trait GridDisplay {
    fn render_cell_body(&self, _: GridCoordinate) -> String {
        String::from("   ")
    }
}

#[derive(Debug)]
pub struct PathDisplay {
    on_path_coordinates: FnvHashSet<GridCoordinate>,
}

impl PathDisplay {
    pub fn new(path: &[GridCoordinate]) -> Self {
        PathDisplay { on_path_coordinates: path.iter().cloned().collect() }
    }
}

impl GridDisplay for PathDisplay {
    fn render_cell_body(&self, coord: GridCoordinate) -> String {
        if self.on_path_coordinates.contains(&coord) {
            String::from(" . ")
        } else {
            String::from("   ")
        }
    }
}

#[derive(Debug)]
pub struct StartEndPointsDisplay {
    start_coordinates: CoordinateSmallVec,
    end_coordinates: CoordinateSmallVec,
}

impl StartEndPointsDisplay {
    pub fn new(starts: CoordinateSmallVec, ends: CoordinateSmallVec) -> StartEndPointsDisplay {
        StartEndPointsDisplay {
            start_coordinates: starts,
            end_coordinates: ends,
        }
    }
}

impl GridDisplay for StartEndPointsDisplay {
    fn render_cell_body(&self, coord: GridCoordinate) -> String {
        let contains = |coordinates: &CoordinateSmallVec| coordinates.iter().any(|&c| c == coord);

        if contains(&self.start_coordinates) {
            String::from(" S ")
        } else if contains(&self.end_coordinates) {
            String::from(" E ")
        } else {
            String::from("   ")
        }
    }
}

impl<MaxDistanceT: MaxDistance> GridDisplay for Distances<MaxDistanceT> {
    fn render_cell_body(&self, coord: GridCoordinate) -> String {
        if let Some(d) = self.distance_from_start_to(coord) {
            // centre align, padding 3, lowercase hexadecimal
            format!("{:^3x}", d)
        } else {
            String::from("   ")
        }
    }
}

/// Draw one level of a grid as box-drawing text. Meaningful for the
/// rectangular topology; other topologies render with their row/column
/// passages only, which is a rough sketch at best.
///
/// Masked cells draw as sealed rooms: every query against them reports a
/// wall.
pub fn render_level<Ix: IndexType>(grid: &Grid<Ix>,
                                   level: u32,
                                   display: Option<&dyn GridDisplay>)
                                   -> String {
    const WALL_L: &str = "╴";
    const WALL_R: &str = "╶";
    const WALL_U: &str = "╵";
    const WALL_D: &str = "╷";
    const WALL_LR_3: &str = "───";
    const WALL_LR: &str = "─";
    const WALL_UD: &str = "│";
    const WALL_LD: &str = "┐";
    const WALL_RU: &str = "└";
    const WALL_LU: &str = "┘";
    const WALL_RD: &str = "┌";
    const WALL_LRU: &str = "┴";
    const WALL_LRD: &str = "┬";
    const WALL_LRUD: &str = "┼";
    const WALL_RUD: &str = "├";
    const WALL_LUD: &str = "┤";

    let rows_count = grid.rows().0;
    let columns_count = grid.columns().0;
    if rows_count == 0 || columns_count == 0 {
        return String::new();
    }

    let cell = |row: usize, column: usize| GridCoordinate::new(row as u32, column as u32, level);
    let linked_at = |coord: GridCoordinate, dr: i32, dc: i32| {
        grid.offset(coord, dr, dc, 0)
            .map_or(false, |neighbour| grid.is_linked(coord, neighbour))
    };

    // The north-most boundary is a special case; every other horizontal wall
    // is drawn as the southern boundary of the row above it.
    let mut output = String::from(WALL_RD);
    for column in 0..columns_count {
        output.push_str(WALL_LR_3);
        let is_east_open = linked_at(cell(0, column), 0, 1);
        if is_east_open {
            output.push_str(WALL_LR);
        } else if column == columns_count - 1 {
            output.push_str(WALL_LD);
        } else {
            output.push_str(WALL_LRD);
        }
    }
    output.push('\n');

    for row in 0..rows_count {
        let is_last_row = row == rows_count - 1;
        let mut row_middle_section_render = String::from(WALL_UD);
        let mut row_bottom_section_render = String::new();

        for column in 0..columns_count {
            let coord = cell(row, column);
            let is_first_column = column == 0;
            let is_last_column = column == columns_count - 1;
            let east_open = linked_at(coord, 0, 1);
            let south_open = linked_at(coord, 1, 0);

            // Each cell only renders its body, its eastern boundary and its
            // southern boundary; everything else belongs to its neighbours.
            if let Some(displayer) = display {
                row_middle_section_render.push_str(displayer.render_cell_body(coord).as_str());
            } else {
                row_middle_section_render.push_str("   ");
            }
            row_middle_section_render.push_str(if east_open { " " } else { WALL_UD });

            if is_first_column {
                row_bottom_section_render = if is_last_row {
                    String::from(WALL_RU)
                } else if south_open {
                    String::from(WALL_UD)
                } else {
                    String::from(WALL_RUD)
                };
            }
            row_bottom_section_render.push_str(if south_open { "   " } else { WALL_LR_3 });

            let corner = match (is_last_row, is_last_column) {
                (true, true) => WALL_LU,
                (true, false) => if east_open { WALL_LR } else { WALL_LRU },
                (false, true) => if south_open { WALL_UD } else { WALL_LUD },
                (false, false) => {
                    let access_se_from_east = grid.offset(coord, 0, 1, 0)
                        .map_or(false, |east| linked_at(east, 1, 0));
                    let access_se_from_south = grid.offset(coord, 1, 0, 0)
                        .map_or(false, |south| linked_at(south, 0, 1));
                    let show_right_section = !access_se_from_east;
                    let show_down_section = !access_se_from_south;
                    let show_up_section = !east_open;
                    let show_left_section = !south_open;

                    match (show_left_section, show_right_section, show_up_section, show_down_section) {
                        (true, true, true, true) => WALL_LRUD,
                        (true, true, true, false) => WALL_LRU,
                        (true, true, false, true) => WALL_LRD,
                        (true, false, true, true) => WALL_LUD,
                        (false, true, true, true) => WALL_RUD,
                        (true, true, false, false) => WALL_LR,
                        (false, false, true, true) => WALL_UD,
                        (false, true, true, false) => WALL_RU,
                        (true, false, false, true) => WALL_LD,
                        (true, false, true, false) => WALL_LU,
                        (false, true, false, true) => WALL_RD,
                        (true, false, false, false) => WALL_L,
                        (false, true, false, false) => WALL_R,
                        (false, false, true, false) => WALL_U,
                        (false, false, false, true) => WALL_D,
                        _ => " ",
                    }
                }
            };
            row_bottom_section_render.push_str(corner);
        }

        output.push_str(&row_middle_section_render);
        output.push('\n');
        output.push_str(&row_bottom_section_render);
        output.push('\n');
    }

    output
}

impl<Ix: IndexType> fmt::Display for Grid<Ix> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for level in 0..self.levels().0 {
            if level > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", render_level(self, level as u32, None))?;
        }
        Ok(())
    }
}
