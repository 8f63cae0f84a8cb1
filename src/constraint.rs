use std::collections::HashSet;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::iter::empty;

use either::Either;
use frozenset::{Freeze, FrozenSet};
use itertools::Itertools;

use crate::{Cell, InconsistencyError};

/// What a constraint proves about every one of its cells
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    Safe,
    Mine,
}

/// A sentence of knowledge about the board: exactly `count` of `cells` are
/// mines.
///
/// Cells leave the constraint as they become known elsewhere (see
/// [`Constraint::resolve_as_mine`] and [`Constraint::resolve_as_safe`]); once
/// no cells are left the constraint is trivial and says nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Constraint<T: Cell> {
    /// Cells whose state is not yet known
    cells: HashSet<T>,
    /// How many of `cells` are mines
    count: usize,
}
impl<T: Cell> Hash for Constraint<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cells.clone().freeze().hash(state);
        self.count.hash(state);
    }
}
impl<T: Cell> Constraint<T> {
    pub fn new(
        cells: impl IntoIterator<Item = T>,
        count: usize,
    ) -> Result<Self, InconsistencyError> {
        let cells = cells.into_iter().collect::<HashSet<_>>();
        if count > cells.len() {
            return Err(InconsistencyError("Constraint with more mines than cells"));
        }
        Ok(Self {
            cells,
            count,
        })
    }

    pub fn cells(&self) -> &HashSet<T> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Does this constraint contain no cells (and thus no information)?
    pub fn is_trivial(&self) -> bool {
        self.cells.is_empty()
    }

    /// If every cell in this constraint shares the same fate, return it
    pub fn verdict(&self) -> Option<Verdict> {
        if self.count == 0 {
            Some(Verdict::Safe)
        } else if self.count == self.cells.len() {
            Some(Verdict::Mine)
        } else {
            None
        }
    }

    /// The cells that must be mines: all of them if the count equals the
    /// number of cells (and is non-zero), otherwise none
    pub fn known_mines(&self) -> FrozenSet<T> {
        match self.verdict() {
            Some(Verdict::Mine) => self.cells.clone().freeze(),
            _ => FrozenSet::default(),
        }
    }

    /// The cells that must be safe: all of them if the count is zero,
    /// otherwise none
    pub fn known_safes(&self) -> FrozenSet<T> {
        match self.verdict() {
            Some(Verdict::Safe) => self.cells.clone().freeze(),
            _ => FrozenSet::default(),
        }
    }

    /// Every cell this constraint decides on its own, with its verdict
    pub fn deductions(&self) -> impl Iterator<Item = (T, Verdict)> + '_ {
        match self.verdict() {
            Some(verdict) => {
                Either::Left(self.cells.iter().map(move |cell| (cell.clone(), verdict)))
            },
            None => Either::Right(empty()),
        }
    }

    /// Remove `cell` from the constraint, counting it as one of the mines.
    /// Returns `false` (and does nothing) if `cell` is not in the constraint.
    ///
    /// # Panics
    ///
    /// If the constraint has no mines left to account for `cell`; that can
    /// only happen if the caller's bookkeeping is wrong.
    pub fn resolve_as_mine(&mut self, cell: &T) -> bool {
        if !self.cells.remove(cell) {
            return false;
        }
        self.count = self
            .count
            .checked_sub(1)
            .expect("Resolved a mine in a constraint with no mines left");
        true
    }

    /// Remove `cell` from the constraint, leaving the count unchanged.
    /// Returns `false` (and does nothing) if `cell` is not in the constraint.
    ///
    /// # Panics
    ///
    /// If every remaining cell had to be a mine; that can only happen if the
    /// caller's bookkeeping is wrong.
    pub fn resolve_as_safe(&mut self, cell: &T) -> bool {
        if !self.cells.remove(cell) {
            return false;
        }
        assert!(
            self.count <= self.cells.len(),
            "Resolved a safe cell in a constraint whose cells were all mines"
        );
        true
    }

    /// Check if this constraint's cells are a strict, non-empty subset of
    /// `other`'s
    pub fn is_strict_subset_of(&self, other: &Self) -> bool {
        !self.cells.is_empty()
            && self.cells.len() < other.cells.len()
            && self.cells.is_subset(&other.cells)
    }

    /// If `sub`'s cells are a subset of this constraint's cells, return the
    /// constraint over the remaining cells: they hold exactly the mines that
    /// `sub` does not account for.
    pub fn subtract(&self, sub: &Self) -> Result<Self, InconsistencyError> {
        if !sub.cells.is_subset(&self.cells) {
            return Err(InconsistencyError("Subtraction of a non-subset constraint"));
        }
        let count = self.count.checked_sub(sub.count).ok_or(InconsistencyError(
            "Subset constraint holds more mines than its superset",
        ))?;
        Self::new(self.cells.difference(&sub.cells).cloned(), count)
    }
}
impl<T: Cell + Ord + Debug> Display for Constraint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}} = {}",
            self.cells.iter().sorted().map(|cell| format!("{cell:?}")).join(", "),
            self.count
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use super::*;

    fn constraint(cells: &str, count: usize) -> Constraint<char> {
        Constraint::new(cells.chars(), count).unwrap()
    }

    fn set(cells: &str) -> HashSet<char> {
        cells.chars().collect()
    }

    #[test]
    fn rejects_more_mines_than_cells() {
        assert_eq!(
            Constraint::new(['A', 'B'], 3),
            Err(InconsistencyError("Constraint with more mines than cells"))
        );
        // Duplicated cells only count once
        assert!(Constraint::new(['A', 'A'], 2).is_err());
    }

    #[test]
    fn full_count_yields_known_mines() {
        let rule = constraint("ABC", 3);
        assert_eq!(rule.known_mines().iter().cloned().collect::<HashSet<_>>(), set("ABC"));
        assert!(rule.known_safes().is_empty());
        assert_eq!(rule.verdict(), Some(Verdict::Mine));
    }

    #[test]
    fn zero_count_yields_known_safes() {
        let rule = constraint("ABC", 0);
        assert_eq!(rule.known_safes().iter().cloned().collect::<HashSet<_>>(), set("ABC"));
        assert!(rule.known_mines().is_empty());
    }

    #[test]
    fn partial_count_yields_nothing() {
        let rule = constraint("ABC", 2);
        assert!(rule.known_mines().is_empty());
        assert!(rule.known_safes().is_empty());
        assert_eq!(rule.verdict(), None);
        assert_eq!(rule.deductions().count(), 0);
    }

    #[test]
    fn trivial_constraint_is_not_a_mine_fact() {
        let rule = constraint("", 0);
        assert!(rule.is_trivial());
        assert!(rule.known_mines().is_empty());
        assert!(rule.known_safes().is_empty());
    }

    #[test]
    fn deductions_tag_every_cell() {
        let mut deductions = constraint("AB", 2).deductions().collect::<Vec<_>>();
        deductions.sort_by_key(|&(cell, _)| cell);
        assert_eq!(deductions, vec![('A', Verdict::Mine), ('B', Verdict::Mine)]);
    }

    #[test]
    fn resolving_a_mine_decrements_the_count() {
        let mut rule = constraint("ABC", 2);
        assert!(rule.resolve_as_mine(&'A'));
        assert_eq!(rule, constraint("BC", 1));
        // Not present: no-op
        assert!(!rule.resolve_as_mine(&'A'));
        assert_eq!(rule, constraint("BC", 1));
    }

    #[test]
    fn resolving_a_safe_cell_keeps_the_count() {
        let mut rule = constraint("ABC", 1);
        assert!(rule.resolve_as_safe(&'B'));
        assert_eq!(rule, constraint("AC", 1));
        assert!(!rule.resolve_as_safe(&'Z'));
        assert!(rule.resolve_as_safe(&'A'));
        assert_eq!(rule.known_mines().iter().cloned().collect::<HashSet<_>>(), set("C"));
    }

    #[test]
    #[should_panic(expected = "no mines left")]
    fn resolving_a_mine_below_zero_panics() {
        constraint("AB", 0).resolve_as_mine(&'A');
    }

    #[test]
    #[should_panic(expected = "were all mines")]
    fn resolving_a_safe_cell_above_range_panics() {
        constraint("AB", 2).resolve_as_safe(&'A');
    }

    #[test]
    fn subset_difference() {
        let a = constraint("ABC", 1);
        let b = constraint("ABCDE", 2);
        assert!(a.is_strict_subset_of(&b));
        assert!(!b.is_strict_subset_of(&a));
        assert_eq!(b.subtract(&a), Ok(constraint("DE", 1)));
    }

    #[test]
    fn strict_subset_excludes_equal_and_empty_sets() {
        let a = constraint("AB", 1);
        assert!(!a.is_strict_subset_of(&constraint("AB", 1)));
        assert!(!constraint("", 0).is_strict_subset_of(&a));
        assert!(!a.is_strict_subset_of(&constraint("BC", 1)));
    }

    #[test]
    fn subtract_rejects_inconsistent_operands() {
        let b = constraint("ABC", 1);
        assert!(b.subtract(&constraint("AD", 1)).is_err());
        assert!(b.subtract(&constraint("AB", 2)).is_err());
        // Remainder cannot hold the leftover mines
        assert!(constraint("ABC", 3).subtract(&constraint("AB", 0)).is_err());
    }

    #[test]
    fn equality_ignores_order() {
        let forwards = constraint("ABC", 1);
        let backwards = constraint("CBA", 1);
        assert_eq!(forwards, backwards);
        assert_ne!(forwards, constraint("ABC", 2));
        let unique = [forwards, backwards].into_iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), 1);
    }

    #[test]
    fn display_lists_sorted_cells() {
        let rule = Constraint::new([(1, 0), (0, 1)], 1).unwrap();
        assert_eq!(rule.to_string(), "{(0, 1), (1, 0)} = 1");
        assert_eq!(constraint("", 0).to_string(), "{} = 0");
    }
}
