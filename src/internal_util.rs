use std::cmp::min;

use itertools::Itertools;

use crate::{BoardDimensions, Coord};

/// Get the cells adjacent to the given cell, clipped to the board
pub(crate) fn adjacent((row, col): Coord, dimensions: BoardDimensions) -> Vec<Coord> {
    if !dimensions.contains((row, col)) {
        return Vec::new();
    }
    (row.saturating_sub(1)..=min(row + 1, dimensions.height - 1))
        .cartesian_product(col.saturating_sub(1)..=min(col + 1, dimensions.width - 1))
        .filter(|&cell| cell != (row, col))
        .collect()
}
