//! One match: a locked [`GameEngine`] plus the [`SessionRegistry`] of its
//! two seats.
//!
//! Lock order is engine, then registry. Registry calls never take the engine
//! lock, so the order cannot invert. Every seat change made through the room
//! happens with the engine lock held.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info};

use crate::broadcast::fan_out;
use crate::common::{Score, Slot};
use crate::error::{MoveError, ServerFull};
use crate::game::{GameEngine, GameResult, GameState, MoveOutcome, Phase};
use crate::protocol::ServerMessage;
use crate::session::{Outbox, Session, SessionRegistry};

/// Why a player left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// Sent `QUIT`.
    Quit,
    /// EOF, reset, or a failed delivery.
    ConnectionLost,
}

impl Departure {
    fn notice(self, slot: Slot) -> ServerMessage {
        match self {
            Departure::Quit => ServerMessage::status(format!("{} has left the game.", slot)),
            Departure::ConnectionLost => {
                ServerMessage::status(format!("{} has disconnected.", slot))
            }
        }
    }
}

fn push_result(batch: &mut Vec<ServerMessage>, result: &GameResult) {
    batch.push(ServerMessage::GameOver(result.score));
    batch.push(ServerMessage::winner(result));
}

pub struct GameRoom {
    engine: Mutex<GameEngine>,
    registry: SessionRegistry,
}

impl GameRoom {
    pub fn new() -> Self {
        Self::with_engine(GameEngine::new())
    }

    /// Room around an existing engine, e.g. one restored from a snapshot.
    pub fn with_engine(engine: GameEngine) -> Self {
        Self {
            engine: Mutex::new(engine),
            registry: SessionRegistry::new(),
        }
    }

    fn engine(&self) -> MutexGuard<'_, GameEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn snapshot(&self) -> GameState {
        self.engine().state()
    }

    pub fn score(&self) -> Score {
        self.engine().score()
    }

    pub fn phase(&self) -> Phase {
        self.engine().phase()
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == Phase::Finished
    }

    /// Seat a connection. The newcomer privately gets its seat and the board;
    /// everyone gets the score, and the start notice once both seats are full.
    ///
    /// Seating and starting happen in one engine critical section, so a
    /// filled room is always a started one and the newcomer's greeting comes
    /// before any broadcast it receives.
    pub fn join(&self, outbox: Outbox) -> Result<Session, ServerFull> {
        let mut engine = self.engine();
        let session = self.registry.register(outbox).inspect_err(|_| {
            info!("connection rejected: match is full");
        })?;
        info!("{} joined as {}", session.slot(), session.color());

        let _ = session.deliver(ServerMessage::Welcome(session.slot()));
        let _ = session.deliver(ServerMessage::Board(*engine.board()));

        let mut batch = vec![ServerMessage::Score(engine.score())];
        let mut result = None;
        if self.registry.is_full() && engine.start() {
            info!("both seats filled, match started");
            batch.push(ServerMessage::status("Game started!"));
            result = engine.result();
            match &result {
                Some(result) => push_result(&mut batch, result),
                None => batch.push(ServerMessage::turn(engine.turn())),
            }
        }
        let dead = fan_out(&self.registry, &batch);
        let closing = match result {
            Some(_) => self.registry.drain(),
            None => Vec::new(),
        };
        drop(engine);

        closing.iter().for_each(Session::close);
        self.bury(dead);
        Ok(session)
    }

    /// Submit a move for `slot` and broadcast its effect.
    ///
    /// Validation, mutation and queueing the broadcast all happen under the
    /// engine lock, so board updates reach every seat in acceptance order.
    /// Errors go back to the caller only.
    pub fn play(&self, slot: Slot, x: i32, y: i32) -> Result<MoveOutcome, MoveError> {
        let mut engine = self.engine();
        let outcome = engine.submit_move(slot, x, y).inspect_err(|e| {
            debug!("{} move ({}, {}) rejected: {}", slot, x, y, e);
        })?;
        debug!(
            "{} played ({}, {}), flipped {}",
            slot,
            x,
            y,
            outcome.flipped().len()
        );

        let mut batch = vec![
            ServerMessage::Board(outcome.board),
            ServerMessage::Score(outcome.score),
        ];
        match (&outcome.result, outcome.next_turn) {
            (Some(result), _) => push_result(&mut batch, result),
            (None, Some(next)) => {
                if outcome.passed {
                    batch.push(ServerMessage::pass(outcome.mover));
                }
                batch.push(ServerMessage::turn(next));
            }
            (None, None) => {}
        }
        let dead = fan_out(&self.registry, &batch);
        let closing = match &outcome.result {
            Some(result) => {
                info!(
                    "game over after {} moves, final score white {} black {}",
                    engine.moves_played(),
                    result.score.white,
                    result.score.black
                );
                self.registry.drain()
            }
            None => Vec::new(),
        };
        drop(engine);

        closing.iter().for_each(Session::close);
        self.bury(dead);
        Ok(outcome)
    }

    /// Relay chat from `slot` to every seat, the sender included.
    pub fn chat(&self, slot: Slot, text: String) {
        let engine = self.engine();
        let dead = fan_out(&self.registry, &[ServerMessage::Chat { from: slot, text }]);
        drop(engine);
        self.bury(dead);
    }

    /// Remove `slot`, tell the others, and forfeit the match if it was under
    /// way. Safe to call more than once for the same seat.
    ///
    /// A seat left before the match started is offered to the next
    /// connection again.
    pub fn depart(&self, slot: Slot, why: Departure) {
        let mut engine = self.engine();
        let Some(session) = self.registry.unregister(slot) else {
            return;
        };
        session.close();
        info!("{} left: {:?}", slot, why);

        let mut batch = vec![why.notice(slot)];
        let result = engine.forfeit(session.color());
        if engine.phase() == Phase::WaitingForPlayers {
            self.registry.reopen();
        }
        if let Some(result) = &result {
            push_result(&mut batch, result);
        }
        let dead = fan_out(&self.registry, &batch);
        let closing = match result {
            Some(_) => self.registry.drain(),
            None => Vec::new(),
        };
        drop(engine);

        closing.iter().for_each(Session::close);
        self.bury(dead);
    }

    fn bury(&self, dead: Vec<Slot>) {
        for slot in dead {
            self.depart(slot, Departure::ConnectionLost);
        }
    }
}

impl Default for GameRoom {
    fn default() -> Self {
        Self::new()
    }
}
