// Dot-connection puzzle: pure path validation and level data

pub mod board;
pub mod geometry;
pub mod levels;

pub use board::{Board, Level};
pub use geometry::Cell;
