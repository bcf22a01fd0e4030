//! Board geometry and game state.

use std::fmt;
use std::str::FromStr;

pub const SIZE: usize = 8;
/// Rows each side starts with.
pub const HOME_ROWS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    /// Starts on the bottom rows and moves toward row 0.
    One,
    /// Starts on the top rows and moves toward the last row.
    Two,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Row delta of a forward move.
    pub fn forward(self) -> isize {
        match self {
            Player::One => -1,
            Player::Two => 1,
        }
    }

    /// Row on which this player's pieces are crowned.
    pub fn crown_row(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => SIZE - 1,
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            Player::One => "player-one",
            Player::Two => "player-two",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Player::One => "one",
            Player::Two => "two",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub player: Player,
    pub king: bool,
}

impl Piece {
    pub fn man(player: Player) -> Self {
        Self {
            player,
            king: false,
        }
    }

    pub fn king(player: Player) -> Self {
        Self { player, king: true }
    }
}

/// Dark squares are the playable ones.
pub fn is_dark(y: usize, x: usize) -> bool {
    x % 2 == (y + 1) % 2
}

/// A square on the board. Only built through [`Pos::new`], parsing or
/// [`Pos::offset`], so it always indexes inside the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    y: usize,
    x: usize,
}

impl Pos {
    pub fn new(y: usize, x: usize) -> Option<Self> {
        (y < SIZE && x < SIZE).then_some(Self { y, x })
    }

    pub fn y(self) -> usize {
        self.y
    }

    pub fn x(self) -> usize {
        self.x
    }

    pub fn is_dark(self) -> bool {
        is_dark(self.y, self.x)
    }

    pub fn offset(self, dy: isize, dx: isize) -> Option<Pos> {
        let y = self.y.checked_add_signed(dy)?;
        let x = self.x.checked_add_signed(dx)?;
        Pos::new(y, x)
    }

    /// Element id of the square, `Y-X`.
    pub fn id(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.y, self.x)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsePosError {
    Format(String),
    OutOfRange { y: usize, x: usize },
}

impl fmt::Display for ParsePosError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsePosError::Format(input) => {
                write!(f, "expected a square as ROW-COL, got {input:?}")
            }
            ParsePosError::OutOfRange { y, x } => {
                write!(f, "square {y}-{x} is off the {SIZE}x{SIZE} board")
            }
        }
    }
}

impl std::error::Error for ParsePosError {}

impl FromStr for Pos {
    type Err = ParsePosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = || ParsePosError::Format(s.to_string());
        let (y, x) = s.trim().split_once('-').ok_or_else(format)?;
        let y: usize = y.parse().map_err(|_| format())?;
        let x: usize = x.parse().map_err(|_| format())?;
        Pos::new(y, x).ok_or(ParsePosError::OutOfRange { y, x })
    }
}

pub type Board = [[Option<Piece>; SIZE]; SIZE];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    pub board: Board,
    pub active: Option<Pos>,
    pub turn: Player,
    pub winner: Option<Player>,
}

impl Game {
    /// Standard opening position, player one to move.
    pub fn new() -> Self {
        let mut game = Game::empty(Player::One);
        for y in 0..SIZE {
            for x in 0..SIZE {
                if !is_dark(y, x) {
                    continue;
                }
                if y < HOME_ROWS {
                    game.board[y][x] = Some(Piece::man(Player::Two));
                } else if y >= SIZE - HOME_ROWS {
                    game.board[y][x] = Some(Piece::man(Player::One));
                }
            }
        }
        game
    }

    pub fn empty(turn: Player) -> Self {
        Self {
            board: [[None; SIZE]; SIZE],
            active: None,
            turn,
            winner: None,
        }
    }

    pub fn with_piece(mut self, pos: Pos, piece: Piece) -> Self {
        self.board[pos.y][pos.x] = Some(piece);
        self
    }

    pub fn piece(&self, pos: Pos) -> Option<Piece> {
        self.board[pos.y][pos.x]
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Pos, Piece)> + '_ {
        self.board.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(x, square)| square.map(|piece| (Pos { y, x }, piece)))
        })
    }

    pub fn count(&self, player: Player) -> usize {
        self.pieces().filter(|(_, piece)| piece.player == player).count()
    }

    pub fn is_active(&self, pos: Pos) -> bool {
        self.active == Some(pos)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}
