//! Logical minesweeper deduction.
//!
//! A [`KnowledgeBase`] is fed one observation per revealed cell ("this cell
//! has N mines among its neighbours") and derives, with certainty, which
//! unopened cells are safe and which are mines. Nothing is ever guessed: when
//! no certain move exists the host decides what to do, typically by asking a
//! [`FallbackStrategy`] to pick among [`KnowledgeBase::candidate_moves`].
use std::error::Error;
use std::fmt::{self, Display};
use std::hash::Hash;

use itertools::Itertools;

mod constraint;
mod internal_util;
mod knowledge;
pub mod util;

pub use constraint::{Constraint, Verdict};
pub use knowledge::{KnowledgeBase, Saturation};

/// A type that can be used to uniquely identify a cell on the board.
///
/// Automatically implemented for any eligible type.
pub trait Cell: Clone + Hash + Eq {}
impl<T: Clone + Hash + Eq> Cell for T {
}

/// A board coordinate, `(row, col)`
pub type Coord = (usize, usize);

/// The fixed geometry of a board; a knowledge base is bound to one for its
/// whole lifetime.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoardDimensions {
    pub height: usize,
    pub width: usize,
}
impl BoardDimensions {
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
        }
    }

    pub fn contains(&self, (row, col): Coord) -> bool {
        row < self.height && col < self.width
    }

    /// The in-bounds cells within one row and column of `cell`, excluding
    /// `cell` itself
    pub fn neighbours(&self, cell: Coord) -> Vec<Coord> {
        internal_util::adjacent(cell, *self)
    }

    /// Every cell of the board, in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Coord> {
        (0..self.height).cartesian_product(0..self.width)
    }

    pub fn total_cells(&self) -> usize {
        self.height * self.width
    }
}

/// A set of constraints was found to be logically inconsistent.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct InconsistencyError(pub &'static str);
impl Display for InconsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
impl Error for InconsistencyError {
}

/// An observation rejected by [`KnowledgeBase::observe`]. The knowledge base is
/// left untouched whenever one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationError {
    /// The cell is not on the board
    OutOfBounds {
        cell: Coord,
        dimensions: BoardDimensions,
    },
    /// The cell has already been observed
    AlreadyObserved(Coord),
    /// The cell was previously deduced to be a mine, so it cannot have been
    /// revealed
    KnownMine(Coord),
    /// The count is larger than the number of neighbours the cell has
    CountOutOfRange {
        cell: Coord,
        count: usize,
        neighbours: usize,
    },
    /// The count disagrees with mines or safe cells already known around the
    /// cell
    Contradiction {
        cell: Coord,
        count: usize,
        known_mines: usize,
        undetermined: usize,
    },
}
impl Display for ObservationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::OutOfBounds {
                cell,
                dimensions,
            } => {
                write!(
                    f,
                    "cell {cell:?} is outside the {}x{} board",
                    dimensions.height, dimensions.width,
                )
            },
            Self::AlreadyObserved(cell) => {
                write!(f, "cell {cell:?} has already been observed")
            },
            Self::KnownMine(cell) => {
                write!(f, "cell {cell:?} is known to be a mine")
            },
            Self::CountOutOfRange {
                cell,
                count,
                neighbours,
            } => {
                write!(
                    f,
                    "cell {cell:?} reports {count} adjacent mines but only has \
                     {neighbours} neighbours",
                )
            },
            Self::Contradiction {
                cell,
                count,
                known_mines,
                undetermined,
            } => {
                write!(
                    f,
                    "cell {cell:?} reports {count} adjacent mines, but {known_mines} \
                     are already known and only {undetermined} neighbours are \
                     undetermined",
                )
            },
        }
    }
}
impl Error for ObservationError {
}

/// The board an agent is playing against. Board generation and mine placement
/// live behind this trait; the deduction engine only consumes it.
pub trait BoardOracle {
    fn dimensions(&self) -> BoardDimensions;

    fn is_mine(&self, cell: Coord) -> bool;

    /// Number of mines among the in-bounds neighbours of `cell`
    fn nearby_mines(&self, cell: Coord) -> usize;
}

/// Picks a move when no cell is known to be safe.
///
/// `candidates` is never empty. Automatically implemented for closures of the
/// right shape.
pub trait FallbackStrategy {
    fn choose(&mut self, candidates: &[Coord]) -> Option<Coord>;
}
impl<F: FnMut(&[Coord]) -> Option<Coord>> FallbackStrategy for F {
    fn choose(&mut self, candidates: &[Coord]) -> Option<Coord> {
        self(candidates)
    }
}

/// A move suggested by [`KnowledgeBase::next_move`]
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Move {
    /// The cell is provably safe
    Certain(Coord),
    /// Nothing was provably safe; the fallback strategy picked this cell
    Guess(Coord),
}
impl Move {
    pub fn cell(self) -> Coord {
        match self {
            Self::Certain(cell) | Self::Guess(cell) => cell,
        }
    }
}
