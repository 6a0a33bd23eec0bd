//! The 8×8 Othello board: legality checks and the flipping rule.
//!
//! The board stores one [`BitBoard`] per color. A cell is empty when it is in
//! neither set; the two sets are never allowed to overlap.

use alloc::vec::Vec;
use core::fmt;

use crate::bitboard::BitBoard;
use crate::common::{Cell, Color, Score, Square};
use crate::config::BOARD_SIZE;

type BB = BitBoard<u64, { BOARD_SIZE as usize }>;

const SIZE: usize = BOARD_SIZE as usize;

/// The eight ray directions as (row, column) steps.
const DIRECTIONS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Errors building a board from a textual layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// Layout did not have exactly `BOARD_SIZE` rows.
    WrongRowCount(usize),
    /// A row did not have exactly `BOARD_SIZE` cells.
    WrongRowLength { row: usize, len: usize },
    /// A cell symbol other than `B`, `W` or `.`.
    BadSymbol { row: usize, col: usize, symbol: char },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardError::WrongRowCount(n) => {
                write!(f, "expected {} rows, found {}", BOARD_SIZE, n)
            }
            BoardError::WrongRowLength { row, len } => {
                write!(f, "row {} has {} cells, expected {}", row, len, BOARD_SIZE)
            }
            BoardError::BadSymbol { row, col, symbol } => {
                write!(f, "unknown cell symbol {:?} at ({}, {})", symbol, row, col)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BoardError {}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    black: BB,
    white: BB,
}

impl Board {
    /// Standard opening position: White on (3,3) and (4,4), Black on (3,4) and (4,3).
    pub fn new() -> Self {
        let mut board = Self::empty();
        board.put(Square { x: 3, y: 3 }, Color::White);
        board.put(Square { x: 3, y: 4 }, Color::Black);
        board.put(Square { x: 4, y: 3 }, Color::Black);
        board.put(Square { x: 4, y: 4 }, Color::White);
        board
    }

    /// A board with no stones at all.
    pub fn empty() -> Self {
        Board {
            black: BB::new(),
            white: BB::new(),
        }
    }

    /// Build an arbitrary position from a cell grid indexed `[x][y]`.
    pub fn from_cells(cells: [[Cell; SIZE]; SIZE]) -> Self {
        let mut board = Self::empty();
        for (x, row) in cells.iter().enumerate() {
            for (y, cell) in row.iter().enumerate() {
                if let Some(color) = cell.color() {
                    board.put(
                        Square {
                            x: x as u8,
                            y: y as u8,
                        },
                        color,
                    );
                }
            }
        }
        board
    }

    /// Parse a position from rows of `B`, `W` and `.` (whitespace ignored).
    pub fn from_rows<I, S>(rows: I) -> Result<Self, BoardError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut cells = [[Cell::Empty; SIZE]; SIZE];
        let mut count = 0;
        for (x, row) in rows.into_iter().enumerate() {
            count += 1;
            if x >= SIZE {
                continue;
            }
            let symbols = row.as_ref().chars().filter(|c| !c.is_whitespace());
            let mut len = 0;
            for (y, symbol) in symbols.enumerate() {
                len += 1;
                if y >= SIZE {
                    continue;
                }
                cells[x][y] = match symbol {
                    'B' | 'b' => Cell::Black,
                    'W' | 'w' => Cell::White,
                    '.' | '-' => Cell::Empty,
                    other => {
                        return Err(BoardError::BadSymbol {
                            row: x,
                            col: y,
                            symbol: other,
                        })
                    }
                };
            }
            if len != SIZE {
                return Err(BoardError::WrongRowLength { row: x, len });
            }
        }
        if count != SIZE {
            return Err(BoardError::WrongRowCount(count));
        }
        Ok(Self::from_cells(cells))
    }

    /// Grid copy of the position indexed `[x][y]`.
    pub fn cells(&self) -> [[Cell; SIZE]; SIZE] {
        core::array::from_fn(|x| {
            core::array::from_fn(|y| {
                self.at(Square {
                    x: x as u8,
                    y: y as u8,
                })
            })
        })
    }

    /// Content of (x, y), or `None` off the board.
    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        Square::new(x, y).map(|sq| self.at(sq))
    }

    fn at(&self, sq: Square) -> Cell {
        let (row, col) = sq.row_col();
        if self.black.contains(row, col).unwrap_or(false) {
            Cell::Black
        } else if self.white.contains(row, col).unwrap_or(false) {
            Cell::White
        } else {
            Cell::Empty
        }
    }

    fn stones_mut(&mut self, color: Color) -> &mut BB {
        match color {
            Color::Black => &mut self.black,
            Color::White => &mut self.white,
        }
    }

    fn put(&mut self, sq: Square, color: Color) {
        let (row, col) = sq.row_col();
        // Squares are on the board by construction, so neither call can fail.
        let _ = self.stones_mut(color.opponent()).remove(row, col);
        let _ = self.stones_mut(color).insert(row, col);
    }

    /// Number of opponent stones `color` would capture from `sq` along `dir`.
    /// Zero unless the run of opponent stones is closed by a `color` stone.
    fn capture_len(&self, color: Color, sq: Square, (dx, dy): (i32, i32)) -> usize {
        let opponent = color.opponent();
        let mut x = i32::from(sq.x) + dx;
        let mut y = i32::from(sq.y) + dy;
        let mut run = 0;
        while let Some(cell) = self.cell(x, y) {
            match cell.color() {
                Some(c) if c == opponent => run += 1,
                Some(_) => return run,
                None => return 0,
            }
            x += dx;
            y += dy;
        }
        0
    }

    /// Whether `color` may place a stone on (x, y).
    ///
    /// False for off-board or occupied cells; otherwise true iff at least one
    /// of the eight rays from (x, y) captures.
    pub fn is_legal_move(&self, color: Color, x: i32, y: i32) -> bool {
        let Some(sq) = Square::new(x, y) else {
            return false;
        };
        self.at(sq) == Cell::Empty
            && DIRECTIONS
                .iter()
                .any(|&dir| self.capture_len(color, sq, dir) > 0)
    }

    /// Place a `color` stone on (x, y) and flip every captured stone.
    ///
    /// The caller must have checked [`is_legal_move`](Self::is_legal_move);
    /// legality is not re-validated here. Returns every square that changed,
    /// the placed square first. An off-board square changes nothing.
    pub fn apply_move(&mut self, color: Color, x: i32, y: i32) -> Vec<Square> {
        let Some(sq) = Square::new(x, y) else {
            return Vec::new();
        };
        let runs: [usize; 8] = core::array::from_fn(|i| self.capture_len(color, sq, DIRECTIONS[i]));

        let mut changed = Vec::with_capacity(1 + runs.iter().sum::<usize>());
        self.put(sq, color);
        changed.push(sq);
        for (&(dx, dy), &run) in DIRECTIONS.iter().zip(runs.iter()) {
            let (mut x, mut y) = (i32::from(sq.x), i32::from(sq.y));
            for _ in 0..run {
                x += dx;
                y += dy;
                if let Some(flip) = Square::new(x, y) {
                    self.put(flip, color);
                    changed.push(flip);
                }
            }
        }
        changed
    }

    fn empty_squares(&self) -> impl Iterator<Item = Square> {
        (!(self.black | self.white)).cells().map(|(row, col)| Square {
            x: row as u8,
            y: col as u8,
        })
    }

    /// Every square where `color` has a legal move, row-major.
    pub fn legal_moves(&self, color: Color) -> Vec<Square> {
        self.empty_squares()
            .filter(|sq| self.is_legal_move(color, i32::from(sq.x), i32::from(sq.y)))
            .collect()
    }

    pub fn has_any_legal_move(&self, color: Color) -> bool {
        self.empty_squares()
            .any(|sq| self.is_legal_move(color, i32::from(sq.x), i32::from(sq.y)))
    }

    /// Stones of `color` on the board.
    pub fn count(&self, color: Color) -> u32 {
        match color {
            Color::Black => self.black.count_ones() as u32,
            Color::White => self.white.count_ones() as u32,
        }
    }

    pub fn score(&self) -> Score {
        Score {
            white: self.count(Color::White),
            black: self.count(Color::Black),
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Header line of column numbers, then one line per row: the row number and
/// its cells (`B`, `W`, `.`) separated by single spaces.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(" ")?;
        for col in 0..SIZE {
            write!(f, " {}", col)?;
        }
        for (x, row) in self.cells().iter().enumerate() {
            write!(f, "\n{}", x)?;
            for cell in row {
                write!(f, " {}", cell.symbol())?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{")?;
        for row in self.cells() {
            f.write_str("  ")?;
            for cell in row {
                write!(f, "{}", cell.symbol())?;
            }
            writeln!(f)?;
        }
        f.write_str("}")
    }
}

/// Serialized as eight row strings of `B`, `W` and `.`.
#[cfg(feature = "std")]
impl serde::Serialize for Board {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(SIZE))?;
        for row in self.cells() {
            let line: String = row.iter().map(|cell| cell.symbol()).collect();
            seq.serialize_element(&line)?;
        }
        seq.end()
    }
}

#[cfg(feature = "std")]
impl<'de> serde::Deserialize<'de> for Board {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<String>::deserialize(deserializer)?;
        Board::from_rows(rows).map_err(serde::de::Error::custom)
    }
}
