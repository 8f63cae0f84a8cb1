use std::collections::HashSet;

use log::info;

use crate::{
    BoardDimensions,
    BoardOracle,
    Coord,
    FallbackStrategy,
    KnowledgeBase,
    Move,
    ObservationError,
};

/// A fully known board (the "answer key"), for driving an agent in tests and
/// demos. No game logic!
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Where the mines are
    mines: HashSet<Coord>,
    dimensions: BoardDimensions,
}
impl Board {
    /// Create a board from an ASCII-encoded description, where:
    /// - `*` is a mine
    /// - `.` is a clear cell
    /// - Trailing or leading whitespace is ignored
    ///
    /// # Errors
    ///
    /// If the board is not rectangular, has a width or height of 0, or
    /// contains any other character, an error is returned.
    pub fn new(encoded: &str) -> Result<Self, String> {
        let lines = encoded.trim().lines().map(|l| l.trim()).collect::<Vec<_>>();
        let height = lines.len();
        if height == 0 {
            return Err("Board must have at least one row".to_string());
        }
        let width = lines[0].len();
        if width == 0 {
            return Err("Board must have at least one column".to_string());
        }
        if let Some(line) = lines.iter().find(|l| l.len() != width) {
            return Err(format!(
                concat!(
                    "Board must be rectangular (found line with length {},",
                    " expected length {})",
                ),
                line.len(),
                width,
            ));
        }
        let mut mines = HashSet::new();
        for (row, line) in lines.into_iter().enumerate() {
            for (col, c) in line.chars().enumerate() {
                match c {
                    '*' => {
                        mines.insert((row, col));
                    },
                    '.' => (),
                    _ => {
                        return Err(format!(
                            "Invalid character '{}' at ({}, {})",
                            c, row, col
                        ));
                    },
                }
            }
        }
        Ok(Self {
            mines,
            dimensions: BoardDimensions::new(height, width),
        })
    }

    /// Create a board with mines at the given cells; cells outside the board
    /// are ignored
    pub fn from_mines(
        dimensions: BoardDimensions,
        mines: impl IntoIterator<Item = Coord>,
    ) -> Self {
        Self {
            mines: mines
                .into_iter()
                .filter(|&cell| dimensions.contains(cell))
                .collect(),
            dimensions,
        }
    }

    pub fn mines(&self) -> &HashSet<Coord> {
        &self.mines
    }

    /// Short human-readable name for a cell, zero-padded to the board size
    pub fn cell_name(&self, (row, col): Coord) -> String {
        format!(
            "{0:01$}-{2:03$}",
            row,
            self.dimensions.height.to_string().len(),
            col,
            self.dimensions.width.to_string().len()
        )
    }
}
impl BoardOracle for Board {
    fn dimensions(&self) -> BoardDimensions {
        self.dimensions
    }

    fn is_mine(&self, cell: Coord) -> bool {
        self.mines.contains(&cell)
    }

    fn nearby_mines(&self, cell: Coord) -> usize {
        self.dimensions
            .neighbours(cell)
            .into_iter()
            .filter(|neighbour| self.mines.contains(neighbour))
            .count()
    }
}

/// Has every cell without a mine been revealed?
pub fn is_cleared(oracle: &impl BoardOracle, knowledge: &KnowledgeBase) -> bool {
    oracle
        .dimensions()
        .cells()
        .all(|cell| oracle.is_mine(cell) || knowledge.moves_made().contains(&cell))
}

/// How a game played by [`play`] ended
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Outcome {
    /// Every clear cell was revealed
    Won,
    /// The agent revealed a mine (only ever on a guess)
    Lost(Coord),
    /// The fallback strategy declined to guess
    Stuck,
}

/// The record of a finished game
#[derive(Debug, Clone)]
pub struct Game {
    pub knowledge: KnowledgeBase,
    /// Every move made, in order, including a losing one
    pub moves: Vec<Move>,
    pub outcome: Outcome,
}

/// Reference game loop: reveal certain moves while there are any, and ask
/// `fallback` to guess when there aren't, until the board is cleared or a mine
/// is hit.
///
/// # Errors
///
/// If the knowledge base rejects an observation; with a well-behaved oracle
/// this only happens when `fallback` picks a cell that was already revealed.
pub fn play(
    oracle: &impl BoardOracle,
    fallback: &mut impl FallbackStrategy,
) -> Result<Game, ObservationError> {
    let mut knowledge = KnowledgeBase::with_dimensions(oracle.dimensions());
    let mut moves = Vec::new();
    let outcome = loop {
        if is_cleared(oracle, &knowledge) {
            break Outcome::Won;
        }
        let Some(next) = knowledge.next_move(fallback) else {
            break Outcome::Stuck;
        };
        moves.push(next);
        let cell = next.cell();
        if oracle.is_mine(cell) {
            break Outcome::Lost(cell);
        }
        knowledge.observe(cell, oracle.nearby_mines(cell))?;
    };
    info!(
        "Game over after {} moves ({} guesses): {outcome:?}",
        moves.len(),
        moves.iter().filter(|m| matches!(m, Move::Guess(_))).count(),
    );
    Ok(Game {
        knowledge,
        moves,
        outcome,
    })
}
