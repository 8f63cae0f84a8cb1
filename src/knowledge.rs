use std::collections::HashSet;

use itertools::Itertools;
use log::{debug, trace, warn};

use crate::constraint::{Constraint, Verdict};
use crate::{
    BoardDimensions,
    Coord,
    FallbackStrategy,
    InconsistencyError,
    Move,
    ObservationError,
};

/// Tally of the work done by one call to [`KnowledgeBase::saturate`]
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
pub struct Saturation {
    /// Passes over the constraints, including the final pass that changed
    /// nothing
    pub passes: usize,
    /// Cells newly recorded as safe or as mines
    pub resolved: usize,
    /// Constraints added by the subset-difference rule
    pub derived: usize,
    /// Constraints dropped because they became trivial or duplicated another
    pub pruned: usize,
}
impl Saturation {
    pub fn changed(&self) -> bool {
        self.resolved + self.derived + self.pruned > 0
    }
}

/// Everything an agent knows about one game.
///
/// Holds the cells it has revealed, the cells proven safe or proven mines, and
/// the constraints that are not yet fully resolved. After every
/// [`observe`](Self::observe) the safe and mine sets are as complete as the
/// constraints allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBase {
    dimensions: BoardDimensions,
    moves_made: HashSet<Coord>,
    safe_cells: HashSet<Coord>,
    mine_cells: HashSet<Coord>,
    /// Never contains a known cell once saturated
    constraints: Vec<Constraint<Coord>>,
}
impl KnowledgeBase {
    pub fn new(height: usize, width: usize) -> Self {
        Self::with_dimensions(BoardDimensions::new(height, width))
    }

    pub fn with_dimensions(dimensions: BoardDimensions) -> Self {
        Self {
            dimensions,
            moves_made: HashSet::new(),
            safe_cells: HashSet::new(),
            mine_cells: HashSet::new(),
            constraints: Vec::new(),
        }
    }

    pub fn dimensions(&self) -> BoardDimensions {
        self.dimensions
    }

    pub fn moves_made(&self) -> &HashSet<Coord> {
        &self.moves_made
    }

    pub fn safe_cells(&self) -> &HashSet<Coord> {
        &self.safe_cells
    }

    pub fn mine_cells(&self) -> &HashSet<Coord> {
        &self.mine_cells
    }

    pub fn constraints(&self) -> &[Constraint<Coord>] {
        &self.constraints
    }

    /// Record that `cell` is safe and remove it from every constraint.
    /// Returns whether this was news.
    ///
    /// # Panics
    ///
    /// If `cell` is already known to be a mine.
    pub fn record_safe(&mut self, cell: Coord) -> bool {
        assert!(
            !self.mine_cells.contains(&cell),
            "{cell:?} recorded as safe but is a known mine"
        );
        let new = self.safe_cells.insert(cell);
        for constraint in &mut self.constraints {
            constraint.resolve_as_safe(&cell);
        }
        new
    }

    /// Record that `cell` is a mine and remove it from every constraint.
    /// Returns whether this was news.
    ///
    /// # Panics
    ///
    /// If `cell` is already known to be safe.
    pub fn record_mine(&mut self, cell: Coord) -> bool {
        assert!(
            !self.safe_cells.contains(&cell),
            "{cell:?} recorded as a mine but is known to be safe"
        );
        let new = self.mine_cells.insert(cell);
        for constraint in &mut self.constraints {
            constraint.resolve_as_mine(&cell);
        }
        new
    }

    /// Take in the fact that `cell` was revealed (so is safe) and has
    /// `adjacent_mines` mines among its neighbours, then deduce everything
    /// that follows.
    ///
    /// # Errors
    ///
    /// If the observation is impossible given the board or what is already
    /// known; nothing is changed in that case.
    pub fn observe(
        &mut self,
        cell: Coord,
        adjacent_mines: usize,
    ) -> Result<Saturation, ObservationError> {
        let constraint = self
            .constraint_for(cell, adjacent_mines)
            .map_err(|err| {
                warn!("Rejected observation: {err}");
                err
            })?;
        debug!("Observed {cell:?} with {adjacent_mines} adjacent mines");

        self.moves_made.insert(cell);
        self.record_safe(cell);
        self.insert_constraint(constraint);
        Ok(self.saturate())
    }

    /// Build the constraint an observation contributes: its undetermined
    /// neighbours, less the mines already known among them.
    fn constraint_for(
        &self,
        cell: Coord,
        adjacent_mines: usize,
    ) -> Result<Constraint<Coord>, ObservationError> {
        if !self.dimensions.contains(cell) {
            return Err(ObservationError::OutOfBounds {
                cell,
                dimensions: self.dimensions,
            });
        }
        if self.moves_made.contains(&cell) {
            return Err(ObservationError::AlreadyObserved(cell));
        }
        if self.mine_cells.contains(&cell) {
            return Err(ObservationError::KnownMine(cell));
        }

        let neighbours = self.dimensions.neighbours(cell);
        if adjacent_mines > neighbours.len() {
            return Err(ObservationError::CountOutOfRange {
                cell,
                count: adjacent_mines,
                neighbours: neighbours.len(),
            });
        }
        let (known_mines, undetermined): (Vec<_>, Vec<_>) = neighbours
            .into_iter()
            .filter(|neighbour| !self.safe_cells.contains(neighbour))
            .partition(|neighbour| self.mine_cells.contains(neighbour));

        let contradiction = ObservationError::Contradiction {
            cell,
            count: adjacent_mines,
            known_mines: known_mines.len(),
            undetermined: undetermined.len(),
        };
        let count = adjacent_mines
            .checked_sub(known_mines.len())
            .ok_or(contradiction)?;
        Constraint::new(undetermined, count).map_err(|_| contradiction)
    }

    /// Add a constraint from outside the observation pipeline, after removing
    /// cells that are already known. Does not saturate. Returns whether the
    /// constraint was kept; trivial and duplicate constraints are not.
    ///
    /// # Errors
    ///
    /// If the constraint disagrees with the mines already known.
    pub fn add_constraint(
        &mut self,
        constraint: Constraint<Coord>,
    ) -> Result<bool, InconsistencyError> {
        let (known_mines, unknown): (Vec<_>, Vec<_>) = constraint
            .cells()
            .iter()
            .filter(|&cell| !self.safe_cells.contains(cell))
            .partition(|&cell| self.mine_cells.contains(cell));
        let count = constraint
            .count()
            .checked_sub(known_mines.len())
            .ok_or(InconsistencyError("Constraint has fewer mines than are known"))?;
        let reduced = Constraint::new(unknown.into_iter().copied(), count)?;
        Ok(self.insert_constraint(reduced))
    }

    fn insert_constraint(&mut self, constraint: Constraint<Coord>) -> bool {
        if constraint.is_trivial() || self.constraints.contains(&constraint) {
            return false;
        }
        self.constraints.push(constraint);
        true
    }

    /// Deduce until nothing more can be deduced without a new observation.
    ///
    /// Each pass records every cell some constraint decides on its own, drops
    /// constraints that became trivial or duplicated, then applies the
    /// subset-difference rule to every pair of constraints. Stops after the
    /// first pass that changes nothing.
    ///
    /// # Panics
    ///
    /// If the constraints contradict each other, which means an earlier
    /// observation lied.
    pub fn saturate(&mut self) -> Saturation {
        let mut saturation = Saturation::default();
        loop {
            saturation.passes += 1;
            let resolved = self.propagate();
            let pruned = self.prune();
            let derived = self.derive();
            trace!(
                "Pass {}: resolved {resolved} cells, pruned {pruned} and derived \
                 {derived} constraints",
                saturation.passes,
            );
            saturation.resolved += resolved;
            saturation.pruned += pruned;
            saturation.derived += derived;
            if resolved + pruned + derived == 0 {
                break;
            }
        }
        debug!(
            "Saturated after {} passes: {} safe, {} mines, {} constraints",
            saturation.passes,
            self.safe_cells.len(),
            self.mine_cells.len(),
            self.constraints.len(),
        );
        saturation
    }

    /// Record every cell decided by a single constraint; returns how many were
    /// new
    fn propagate(&mut self) -> usize {
        let mut resolved = 0;
        // Recording shrinks constraints in place but never removes one, so
        // indices taken up front stay valid for the whole scan
        for i in 0..self.constraints.len() {
            let deductions = self.constraints[i].deductions().collect_vec();
            for (cell, verdict) in deductions {
                let new = match verdict {
                    Verdict::Safe => self.record_safe(cell),
                    Verdict::Mine => self.record_mine(cell),
                };
                if new {
                    resolved += 1;
                }
            }
        }
        resolved
    }

    /// Drop trivial and repeated constraints, keeping the first of each
    fn prune(&mut self) -> usize {
        let before = self.constraints.len();
        let mut seen = HashSet::new();
        self.constraints
            .retain(|constraint| !constraint.is_trivial() && seen.insert(constraint.clone()));
        before - self.constraints.len()
    }

    /// Apply the subset-difference rule to every ordered pair of constraints
    fn derive(&mut self) -> usize {
        let mut known = self.constraints.iter().cloned().collect::<HashSet<_>>();
        let derived = self
            .constraints
            .iter()
            .cartesian_product(self.constraints.iter())
            .filter(|(sub, sup)| sub.is_strict_subset_of(sup))
            .map(|(sub, sup)| {
                sup.subtract(sub)
                    .expect("Constraints contradict each other; an observation was wrong")
            })
            // A strict subset always leaves a non-empty remainder
            .filter(|difference| known.insert(difference.clone()))
            .collect_vec();
        let num_derived = derived.len();
        self.constraints.extend(derived);
        num_derived
    }

    /// A cell known to be safe that has not been revealed yet, if any
    pub fn query_next_certain_move(&self) -> Option<Coord> {
        self.safe_cells.difference(&self.moves_made).min().copied()
    }

    /// Cells worth guessing when no certain move exists: everything not yet
    /// revealed and not known to be a mine, in row-major order
    pub fn candidate_moves(&self) -> impl Iterator<Item = Coord> + '_ {
        self.dimensions.cells().filter(move |cell| {
            !self.moves_made.contains(cell) && !self.mine_cells.contains(cell)
        })
    }

    /// A certain move if there is one, otherwise whatever `fallback` picks from
    /// [`candidate_moves`](Self::candidate_moves). `None` once no candidates
    /// remain.
    pub fn next_move(&self, fallback: &mut impl FallbackStrategy) -> Option<Move> {
        if let Some(cell) = self.query_next_certain_move() {
            return Some(Move::Certain(cell));
        }
        let candidates = self.candidate_moves().collect_vec();
        if candidates.is_empty() {
            return None;
        }
        let guess = fallback.choose(&candidates)?;
        debug!("No certain move; guessing {guess:?} from {} candidates", candidates.len());
        Some(Move::Guess(guess))
    }
}
