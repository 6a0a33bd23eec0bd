//! Wire messages. Lines are parsed into typed messages once, at the
//! connection boundary; everything past the dispatcher works with these
//! values, never with raw text.

use alloc::borrow::ToOwned;
use alloc::format;
use alloc::string::String;
use core::fmt;
use core::str::FromStr;

use crate::{
    board::Board,
    common::{Color, Score, Slot},
    error::{MoveError, ParseError},
    game::GameResult,
};

/// Messages a client sends, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `MOVE <x> <y>`: place a stone on row `x`, column `y`.
    Move { x: i32, y: i32 },
    /// `CHAT <text>`: relay text to everyone.
    Chat(String),
    /// `QUIT`: leave the match.
    Quit,
}

impl FromStr for ClientMessage {
    type Err = ParseError;

    /// Only the line terminator and whitespace before the command are
    /// dropped. Chat text is kept exactly as sent after `CHAT `.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(&['\r', '\n'][..]).trim_start();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        match command.trim_end() {
            "" => Err(ParseError::Empty),
            "MOVE" => {
                let mut coords = rest.split_whitespace();
                match (coords.next(), coords.next(), coords.next()) {
                    (Some(x), Some(y), None) => Ok(ClientMessage::Move {
                        x: parse_coordinate(x)?,
                        y: parse_coordinate(y)?,
                    }),
                    _ => Err(ParseError::MoveArity(rest.split_whitespace().count())),
                }
            }
            "CHAT" if rest.is_empty() => Err(ParseError::EmptyChat),
            "CHAT" => Ok(ClientMessage::Chat(rest.to_owned())),
            "QUIT" => Ok(ClientMessage::Quit),
            other => Err(ParseError::UnknownCommand(other.to_owned())),
        }
    }
}

fn parse_coordinate(raw: &str) -> Result<i32, ParseError> {
    raw.parse()
        .map_err(|_| ParseError::BadCoordinate(raw.to_owned()))
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMessage::Move { x, y } => write!(f, "MOVE {} {}", x, y),
            ClientMessage::Chat(text) => write!(f, "CHAT {}", text),
            ClientMessage::Quit => f.write_str("QUIT"),
        }
    }
}

/// Messages the server sends. Some render to more than one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Private greeting naming the receiver's seat and color.
    Welcome(Slot),
    /// Relayed chat.
    Chat { from: Slot, text: String },
    /// Full board snapshot.
    Board(Board),
    Score(Score),
    /// Join/leave, turn and pass notices.
    Status(String),
    /// End of match with the final count.
    GameOver(Score),
    InvalidMove,
    NotYourTurn,
    Malformed(ParseError),
    ServerFull,
}

impl ServerMessage {
    pub fn status(text: impl Into<String>) -> Self {
        ServerMessage::Status(text.into())
    }

    /// Announces the side to move.
    pub fn turn(color: Color) -> Self {
        Self::status(format!("{} ({}) to move.", Slot::for_color(color), color))
    }

    /// `color`'s opponent has no legal move and must pass.
    pub fn pass(color: Color) -> Self {
        let passer = color.opponent();
        Self::status(format!(
            "{} ({}) has no legal move and passes.",
            Slot::for_color(passer),
            passer
        ))
    }

    /// Winner line following [`ServerMessage::GameOver`].
    pub fn winner(result: &GameResult) -> Self {
        match (result.winner, result.forfeited_by) {
            (Some(winner), Some(_)) => Self::status(format!(
                "{} ({}) wins by forfeit.",
                Slot::for_color(winner),
                winner
            )),
            (Some(winner), None) => {
                Self::status(format!("{} ({}) wins.", Slot::for_color(winner), winner))
            }
            (None, _) => Self::status("The game is a draw."),
        }
    }
}

impl From<MoveError> for ServerMessage {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::NotYourTurn => ServerMessage::NotYourTurn,
            MoveError::IllegalMove { .. } => ServerMessage::InvalidMove,
            MoveError::NotStarted => ServerMessage::status("Waiting for an opponent to join."),
            MoveError::GameOver => ServerMessage::status("The game is over."),
        }
    }
}

impl From<ParseError> for ServerMessage {
    fn from(err: ParseError) -> Self {
        ServerMessage::Malformed(err)
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Welcome(slot) => {
                write!(f, "STATUS You are {} ({})", slot, slot.color())
            }
            ServerMessage::Chat { from, text } => write!(f, "CHAT {}: {}", from, text),
            ServerMessage::Board(board) => write!(f, "Current Board:\n{}", board),
            ServerMessage::Score(score) => write!(f, "SCORE {} {}", score.white, score.black),
            ServerMessage::Status(text) => write!(f, "STATUS {}", text),
            ServerMessage::GameOver(score) => {
                write!(f, "Game over!\nFinal Score: {} - {}", score.white, score.black)
            }
            ServerMessage::InvalidMove => f.write_str("Invalid move. Try again."),
            ServerMessage::NotYourTurn => f.write_str("It's not your turn."),
            ServerMessage::Malformed(err) if err.is_move() => {
                write!(f, "Error processing move: {}", err)
            }
            ServerMessage::Malformed(err) => write!(f, "STATUS Unrecognised message: {}", err),
            ServerMessage::ServerFull => f.write_str("Server full. Try again later."),
        }
    }
}
