use std::collections::HashSet;

use minesense::util::Board;
use minesense::{BoardDimensions, BoardOracle, KnowledgeBase};
use proptest::prelude::*;

fn boards() -> impl Strategy<Value = Board> {
    (1usize..=6, 1usize..=6)
        .prop_flat_map(|(height, width)| {
            (
                Just(BoardDimensions::new(height, width)),
                proptest::collection::vec(proptest::bool::weighted(0.25), height * width),
            )
        })
        .prop_map(|(dimensions, layout)| {
            Board::from_mines(
                dimensions,
                dimensions
                    .cells()
                    .zip(layout)
                    .filter(|&(_, mine)| mine)
                    .map(|(cell, _)| cell),
            )
        })
}

/// Reveal every clear cell, taking certain moves first and otherwise peeking
/// at the board, checking the knowledge base after each observation
fn explore(board: &Board, mut check: impl FnMut(&KnowledgeBase)) -> KnowledgeBase {
    let mut kb = KnowledgeBase::with_dimensions(board.dimensions());
    loop {
        let next = kb.query_next_certain_move().or_else(|| {
            board
                .dimensions()
                .cells()
                .find(|&cell| !board.is_mine(cell) && !kb.moves_made().contains(&cell))
        });
        let Some(cell) = next else {
            break;
        };
        kb.observe(cell, board.nearby_mines(cell))
            .expect("observations from the board are always valid");
        check(&kb);
    }
    kb
}

proptest! {
    #[test]
    fn deductions_are_sound(board in boards()) {
        explore(&board, |kb| {
            assert!(kb.safe_cells().is_disjoint(kb.mine_cells()));
            for cell in kb.safe_cells() {
                assert!(!board.is_mine(*cell), "{cell:?} deduced safe but is a mine");
            }
            for cell in kb.mine_cells() {
                assert!(board.is_mine(*cell), "{cell:?} deduced to be a mine but is safe");
            }
        });
    }

    #[test]
    fn constraints_stay_in_range(board in boards()) {
        explore(&board, |kb| {
            for constraint in kb.constraints() {
                assert!(!constraint.is_trivial());
                assert!(constraint.count() <= constraint.len());
                assert!(constraint.cells().is_disjoint(kb.safe_cells()));
                assert!(constraint.cells().is_disjoint(kb.mine_cells()));
            }
            let unique = kb.constraints().iter().collect::<HashSet<_>>();
            assert_eq!(unique.len(), kb.constraints().len());
        });
    }

    #[test]
    fn saturation_reaches_a_fixpoint(board in boards()) {
        explore(&board, |kb| {
            let mut again = kb.clone();
            assert!(!again.saturate().changed());
            assert_eq!(&again, kb);
        });
    }

    #[test]
    fn clearing_the_board_finds_every_bordering_mine(board in boards()) {
        let kb = explore(&board, |_| ());
        let bordering = board
            .mines()
            .iter()
            .copied()
            .filter(|&mine| {
                board
                    .dimensions()
                    .neighbours(mine)
                    .into_iter()
                    .any(|neighbour| !board.is_mine(neighbour))
            })
            .collect::<HashSet<_>>();
        prop_assert_eq!(kb.mine_cells(), &bordering);
        prop_assert_eq!(kb.query_next_certain_move(), None);
    }
}
