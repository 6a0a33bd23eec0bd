//! Error kinds surfaced to players.
//!
//! `MoveError` and `ParseError` are recovered locally: the offending sender
//! gets a private reply and nothing else changes. `ServerFull` only occurs
//! while admitting a connection. A lost connection is reported by the
//! transport as an `anyhow::Error` and ends that one session.

use alloc::string::String;
use core::fmt;

/// Why the engine refused a move. The engine state is untouched in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    /// Second seat not filled yet.
    NotStarted,
    /// The submitting seat's color is not the side to move.
    NotYourTurn,
    /// Off the board, occupied, or captures nothing.
    IllegalMove { x: i32, y: i32 },
    /// The match has finished.
    GameOver,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::NotStarted => f.write_str("waiting for an opponent to join"),
            MoveError::NotYourTurn => f.write_str("it is not your turn"),
            MoveError::IllegalMove { x, y } => write!(f, "illegal move at ({}, {})", x, y),
            MoveError::GameOver => f.write_str("the game is over"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MoveError {}

/// A client line that is not a well-formed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    UnknownCommand(String),
    /// `MOVE` needs exactly two coordinates.
    MoveArity(usize),
    /// A `MOVE` coordinate that is not an integer.
    BadCoordinate(String),
    /// `CHAT` with no text after it.
    EmptyChat,
}

impl ParseError {
    /// The line was a `MOVE` that could not be decoded.
    pub fn is_move(&self) -> bool {
        matches!(self, ParseError::MoveArity(_) | ParseError::BadCoordinate(_))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => f.write_str("empty message"),
            ParseError::UnknownCommand(cmd) => write!(f, "unknown command {:?}", cmd),
            ParseError::MoveArity(n) => write!(f, "expected 2 coordinates, got {}", n),
            ParseError::BadCoordinate(raw) => write!(f, "invalid coordinate {:?}", raw),
            ParseError::EmptyChat => f.write_str("chat message is empty"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

/// Both seats of the current match are taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerFull;

impl fmt::Display for ServerFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("server is full")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ServerFull {}
