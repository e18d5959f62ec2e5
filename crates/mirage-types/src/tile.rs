//! Grid Positions and Tiles
//!
//! The world is a bounded integer grid. A `TileView` is the appearance of one
//! cell, either ground truth from the world or a remembered copy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Glyphs the world paints onto cells.
pub mod glyph {
    /// Empty floor
    pub const FLOOR: char = '.';
    /// The drifting environmental marker
    pub const MARKER: char = 'M';
}

/// Integer grid coordinate.
///
/// Ordered by `x` then `y` so maps keyed by position iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan (taxicab) distance to another position.
    pub fn manhattan(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Appearance of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileView {
    pub position: Position,
    pub glyph: char,
    /// True when the view came from the world rather than from imagination
    pub visible: bool,
}

impl TileView {
    /// A truthful view of a cell as the world reports it.
    pub fn seen(position: Position, glyph: char) -> Self {
        Self {
            position,
            glyph,
            visible: true,
        }
    }
}
