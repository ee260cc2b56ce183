//! **polymaze** is a multi-topology maze construction, route finding and
//! visibility geometry library.
//!
//! Grids of square, hexagonal, triangular or polar cells (optionally stacked
//! into levels) are carved into mazes by a family of generation algorithms,
//! solved by a family of route finders, and turned into occlusion geometry
//! for field-of-view rendering. Generation and solving both run as lazy step
//! sequences so a display layer can animate them at its own pace.

pub mod cells;
pub mod generators;
pub mod grid;
pub mod grid_displays;
pub mod grids;
pub mod masks;
pub mod pathing;
pub mod renderers;
pub mod topologies;
pub mod units;
