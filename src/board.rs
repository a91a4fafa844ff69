//! Board state and the rules engine for a single game.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::instrument;

/// Side length of the board.
pub const SIZE: usize = 3;

/// Every row, column and diagonal of this square sums to [`LINE_SUM`].
const MAGIC: [[u8; SIZE]; SIZE] = [[8, 1, 6], [3, 5, 7], [4, 9, 2]];
const LINE_SUM: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Always moves first. Played by the hosting side.
    X,
    O,
}

impl Symbol {
    pub const FIRST: Symbol = Symbol::X;

    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    fn weight(self) -> u8 {
        match self {
            Symbol::X => 1,
            Symbol::O => 2,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::X => f.write_str("X"),
            Symbol::O => f.write_str("O"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Taken(Symbol),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMoveError {
    #[error("expected a move of the form \"row,col\", got {0:?}")]
    Format(String),
    #[error("cell {row},{col} is off the board")]
    OutOfRange { row: i64, col: i64 },
    #[error("cell {0} is already taken")]
    Occupied(Move),
}

/// A `(row, col)` pair addressing one cell. Both coordinates are always in `0..3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    row: u8,
    col: u8,
}

impl Move {
    pub fn new(row: i64, col: i64) -> Result<Self, InvalidMoveError> {
        let in_range = |n: i64| (0..SIZE as i64).contains(&n);
        if !in_range(row) || !in_range(col) {
            return Err(InvalidMoveError::OutOfRange { row, col });
        }
        Ok(Self {
            row: row as u8,
            col: col as u8,
        })
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    fn index(&self) -> (usize, usize) {
        (self.row as usize, self.col as usize)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// Parses `"<row>,<col>"`. Exactly one comma, two integers, both on the board.
impl FromStr for Move {
    type Err = InvalidMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || InvalidMoveError::Format(s.to_string());
        let (row, col) = s.split_once(',').ok_or_else(format_err)?;
        let row: i64 = row.trim().parse().map_err(|_| format_err())?;
        let col: i64 = col.trim().parse().map_err(|_| format_err())?;
        Move::new(row, col)
    }
}

/// The 3x3 grid. Cells only ever go from [`Cell::Empty`] to [`Cell::Taken`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    cells: [[Cell; SIZE]; SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mv: Move) -> Cell {
        let (row, col) = mv.index();
        self.cells[row][col]
    }

    pub fn rows(&self) -> &[[Cell; SIZE]; SIZE] {
        &self.cells
    }

    fn place(&mut self, mv: Move, symbol: Symbol) -> Result<(), InvalidMoveError> {
        let (row, col) = mv.index();
        let cell = &mut self.cells[row][col];
        if *cell != Cell::Empty {
            return Err(InvalidMoveError::Occupied(mv));
        }
        *cell = Cell::Taken(symbol);
        Ok(())
    }

    /// Sums of the weighted magic square over the 3 rows, 3 columns and 2 diagonals.
    ///
    /// A cell weighs its magic number times 1 for X, times 2 for O, and 0 when empty.
    /// A line held entirely by X sums to 15 and one held entirely by O sums to 30;
    /// no mix of the two symbols on a line reaches either value.
    fn line_sums(&self) -> [u8; 8] {
        let mut weighted = [[0u8; SIZE]; SIZE];
        for (row, cells) in self.cells.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if let Cell::Taken(symbol) = cell {
                    weighted[row][col] = MAGIC[row][col] * symbol.weight();
                }
            }
        }

        let row = |r: usize| weighted[r].iter().sum::<u8>();
        let col = |c: usize| weighted.iter().map(|r| r[c]).sum::<u8>();
        [
            row(0),
            row(1),
            row(2),
            col(0),
            col(1),
            col(2),
            weighted[0][0] + weighted[1][1] + weighted[2][2],
            weighted[0][2] + weighted[1][1] + weighted[2][0],
        ]
    }

    /// The symbol holding a complete line, if any.
    pub fn winner(&self) -> Option<Symbol> {
        let sums = self.line_sums();
        [Symbol::X, Symbol::O]
            .into_iter()
            .find(|symbol| sums.contains(&(LINE_SUM * symbol.weight())))
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.iter().enumerate() {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| match cell {
                    Cell::Empty => " ".to_string(),
                    Cell::Taken(symbol) => symbol.to_string(),
                })
                .collect();
            writeln!(f, " {}", cells.join(" | "))?;
            if i != SIZE - 1 {
                writeln!(f, "-----------")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Undecided,
    Winner(Symbol),
    Tie,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Undecided)
    }
}

/// Outcome of `board` after `moves` applied moves.
#[instrument(level = "trace", skip(board))]
pub fn evaluate(board: &Board, moves: u8) -> Outcome {
    match board.winner() {
        Some(symbol) => Outcome::Winner(symbol),
        None if moves as usize == SIZE * SIZE => Outcome::Tie,
        None => Outcome::Undecided,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("the game is already over")]
    Finished,
    #[error(transparent)]
    InvalidMove(#[from] InvalidMoveError),
}

/// One game: the board, whose turn it is, how many moves were made and the outcome.
///
/// Once the outcome is terminal the game rejects every further move.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    turn: Symbol,
    moves: u8,
    outcome: Outcome,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Symbol::FIRST,
            moves: 0,
            outcome: Outcome::Undecided,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Symbol {
        self.turn
    }

    pub fn moves(&self) -> u8 {
        self.moves
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_terminal()
    }

    /// Parses a raw `"row,col"` intent and checks it against the current board.
    pub fn validate(&self, input: &str) -> Result<Move, InvalidMoveError> {
        let mv: Move = input.parse()?;
        if self.board.get(mv) != Cell::Empty {
            return Err(InvalidMoveError::Occupied(mv));
        }
        Ok(mv)
    }

    /// Places the current turn's symbol at `mv`, counts the move, hands the turn
    /// over and re-evaluates the outcome. On error nothing changes.
    pub fn apply(&mut self, mv: Move) -> Result<Outcome, GameError> {
        if self.is_finished() {
            return Err(GameError::Finished);
        }
        self.board.place(mv, self.turn)?;
        self.moves += 1;
        self.turn = self.turn.opponent();
        self.outcome = evaluate(&self.board, self.moves);
        Ok(self.outcome)
    }
}
