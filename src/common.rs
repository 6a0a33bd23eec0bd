//! Common types for Othello: stone colors, cells, seats, squares and scores.

use core::fmt;

use crate::config::BOARD_SIZE;

/// Color of a stone, and of the player who places it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// The other color.
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Single-letter form used in board renderings.
    pub fn symbol(self) -> char {
        match self {
            Color::Black => 'B',
            Color::White => 'W',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => f.write_str("Black"),
            Color::White => f.write_str("White"),
        }
    }
}

/// Content of one board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Black,
    White,
}

impl Cell {
    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Empty => None,
            Cell::Black => Some(Color::Black),
            Cell::White => Some(Color::White),
        }
    }

    pub fn symbol(self) -> char {
        self.color().map_or('.', Color::symbol)
    }
}

impl From<Color> for Cell {
    fn from(color: Color) -> Self {
        match color {
            Color::Black => Cell::Black,
            Color::White => Cell::White,
        }
    }
}

/// Fixed seat a connection occupies for the whole match.
///
/// Seat one plays Black and moves first; seat two plays White.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::One, Slot::Two];

    pub fn color(self) -> Color {
        match self {
            Slot::One => Color::Black,
            Slot::Two => Color::White,
        }
    }

    /// Seat playing `color`.
    pub fn for_color(color: Color) -> Slot {
        match color {
            Color::Black => Slot::One,
            Color::White => Slot::Two,
        }
    }

    /// 1 or 2, as shown to players.
    pub fn number(self) -> u8 {
        match self {
            Slot::One => 1,
            Slot::Two => 2,
        }
    }

    pub fn other(self) -> Slot {
        match self {
            Slot::One => Slot::Two,
            Slot::Two => Slot::One,
        }
    }

    pub(crate) fn index(self) -> usize {
        usize::from(self.number() - 1)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// An on-board coordinate: `x` is the row, `y` the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Square {
    pub x: u8,
    pub y: u8,
}

impl Square {
    /// `None` unless both coordinates are in `[0, BOARD_SIZE)`.
    pub fn new(x: i32, y: i32) -> Option<Square> {
        let size = i32::from(BOARD_SIZE);
        if (0..size).contains(&x) && (0..size).contains(&y) {
            Some(Square {
                x: x as u8,
                y: y as u8,
            })
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn row_col(self) -> (usize, usize) {
        (usize::from(self.x), usize::from(self.y))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Stone counts. Always derived from a board, never stored alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Score {
    pub white: u32,
    pub black: u32,
}

impl Score {
    pub fn of(&self, color: Color) -> u32 {
        match color {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    /// Color with more stones, `None` on a draw.
    pub fn leader(&self) -> Option<Color> {
        match self.black.cmp(&self.white) {
            core::cmp::Ordering::Greater => Some(Color::Black),
            core::cmp::Ordering::Less => Some(Color::White),
            core::cmp::Ordering::Equal => None,
        }
    }
}
