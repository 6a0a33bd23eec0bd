use alloc::vec::Vec;

use crate::{
    board::Board,
    common::{Color, Score, Slot, Square},
    error::MoveError,
};

/// Coarse lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    WaitingForPlayers,
    InProgress,
    Finished,
}

/// How a finished match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GameResult {
    /// Stone count at the moment the match ended.
    pub score: Score,
    /// `None` on a drawn board.
    pub winner: Option<Color>,
    /// Set when the match ended because this color left.
    pub forfeited_by: Option<Color>,
}

/// Everything a successful move changed, computed inside the engine's
/// critical section so it always describes a fully applied move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub mover: Color,
    /// Placed square first, then every flipped square.
    pub changed: Vec<Square>,
    pub board: Board,
    pub score: Score,
    /// Side to move next; `None` once the game is over.
    pub next_turn: Option<Color>,
    /// The opponent had no legal reply, so `mover` moves again.
    pub passed: bool,
    /// Present when this move ended the game.
    pub result: Option<GameResult>,
}

impl MoveOutcome {
    /// Squares flipped by the move (excluding the placed stone).
    pub fn flipped(&self) -> &[Square] {
        self.changed.get(1..).unwrap_or(&[])
    }
}

/// Serializable snapshot of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub board: Board,
    pub turn: Color,
    pub phase: Phase,
    pub moves_played: u32,
    pub forfeited_by: Option<Color>,
}

/// Turn arbitration and end-of-game detection around a [`Board`].
///
/// The engine has no locking of its own; the owner must serialize access
/// (see [`GameRoom`](crate::GameRoom)).
#[derive(Debug, Clone)]
pub struct GameEngine {
    board: Board,
    turn: Color,
    phase: Phase,
    moves_played: u32,
    forfeited_by: Option<Color>,
}

impl GameEngine {
    /// Opening position, Black to move, waiting for players.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Color::Black,
            phase: Phase::WaitingForPlayers,
            moves_played: 0,
            forfeited_by: None,
        }
    }

    /// Restore an engine from a snapshot.
    pub fn from_state(state: GameState) -> Self {
        Self {
            board: state.board,
            turn: state.turn,
            phase: state.phase,
            moves_played: state.moves_played,
            forfeited_by: state.forfeited_by,
        }
    }

    pub fn state(&self) -> GameState {
        GameState {
            board: self.board,
            turn: self.turn,
            phase: self.phase,
            moves_played: self.moves_played,
            forfeited_by: self.forfeited_by,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move. Meaningless once the phase is `Finished`.
    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn moves_played(&self) -> u32 {
        self.moves_played
    }

    /// Recounted from the board on every call.
    pub fn score(&self) -> Score {
        self.board.score()
    }

    /// Both seats are filled: leave `WaitingForPlayers`. Returns whether the
    /// phase changed.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::WaitingForPlayers {
            return false;
        }
        self.phase = Phase::InProgress;
        // A restored position may already be dead.
        self.settle_turn(self.turn.opponent());
        true
    }

    /// Validate and apply one move for the player in `slot`.
    ///
    /// Fails without touching any state unless the match is in progress, it
    /// is `slot`'s turn and the board accepts the move.
    pub fn submit_move(&mut self, slot: Slot, x: i32, y: i32) -> Result<MoveOutcome, MoveError> {
        match self.phase {
            Phase::WaitingForPlayers => return Err(MoveError::NotStarted),
            Phase::Finished => return Err(MoveError::GameOver),
            Phase::InProgress => {}
        }
        let color = slot.color();
        if color != self.turn {
            return Err(MoveError::NotYourTurn);
        }
        if !self.board.is_legal_move(color, x, y) {
            return Err(MoveError::IllegalMove { x, y });
        }

        let changed = self.board.apply_move(color, x, y);
        self.moves_played += 1;
        self.settle_turn(color);

        let next_turn = (self.phase == Phase::InProgress).then_some(self.turn);
        Ok(MoveOutcome {
            mover: color,
            changed,
            board: self.board,
            score: self.board.score(),
            next_turn,
            passed: next_turn == Some(color),
            result: self.result(),
        })
    }

    /// Pick the next side to move after `mover` played: the opponent if it
    /// can move, else `mover` again, else the game is over.
    fn settle_turn(&mut self, mover: Color) {
        let opponent = mover.opponent();
        if self.board.has_any_legal_move(opponent) {
            self.turn = opponent;
        } else if self.board.has_any_legal_move(mover) {
            self.turn = mover;
        } else {
            self.phase = Phase::Finished;
        }
    }

    /// `color` left mid-match. Ends the game and returns the result; does
    /// nothing unless the match is in progress.
    pub fn forfeit(&mut self, color: Color) -> Option<GameResult> {
        if self.phase != Phase::InProgress {
            return None;
        }
        self.phase = Phase::Finished;
        self.forfeited_by = Some(color);
        self.result()
    }

    /// Final result, once the phase is `Finished`.
    pub fn result(&self) -> Option<GameResult> {
        if self.phase != Phase::Finished {
            return None;
        }
        let score = self.board.score();
        let winner = match self.forfeited_by {
            Some(quitter) => Some(quitter.opponent()),
            None => score.leader(),
        };
        Some(GameResult {
            score,
            winner,
            forfeited_by: self.forfeited_by,
        })
    }
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new()
    }
}
