use minesense::util::{play, Board};
use minesense::{Coord, Move};
use simplelog::{Config, LevelFilter, SimpleLogger};

fn main() {
    let level = if std::env::args().any(|arg| arg == "-v" || arg == "--verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = SimpleLogger::init(level, Config::default());

    let board = Board::new(concat!(
        "........\n",
        "........\n",
        ".....*..\n",
        "..*.....\n",
        "......*.\n",
        "*......*\n",
    ))
    .expect("built-in board is valid");
    let game = play(&board, &mut |candidates: &[Coord]| candidates.first().copied());
    match game {
        Ok(game) => {
            for next in &game.moves {
                match next {
                    Move::Certain(cell) => println!("  {}", board.cell_name(*cell)),
                    Move::Guess(cell) => println!("? {}", board.cell_name(*cell)),
                }
            }
            println!("Outcome: {:?}", game.outcome);
            println!("Unresolved: {:#?}", game.knowledge.constraints());
        },
        Err(err) => eprintln!("Error: {err}"),
    }
}
