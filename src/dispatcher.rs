use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::ParseError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::room::{Departure, GameRoom};
use crate::session::Session;
use crate::transport::Inbound;

/// Per-connection read loop.
///
/// Parses each line once, routes moves through the room's engine and chat
/// through the fan-out, and answers errors privately. It only ever waits on
/// its own connection, or on its session being closed by the room.
pub struct Dispatcher<R: Inbound> {
    room: Arc<GameRoom>,
    session: Session,
    inbound: R,
}

impl<R: Inbound> Dispatcher<R> {
    pub fn new(room: Arc<GameRoom>, session: Session, inbound: R) -> Self {
        Self {
            room,
            session,
            inbound,
        }
    }

    pub async fn run(mut self) {
        let slot = self.session.slot();
        loop {
            let next = tokio::select! {
                biased;
                _ = self.session.closed() => {
                    debug!("{} session closed by the server", slot);
                    return;
                }
                line = self.inbound.recv_line() => line,
            };
            let line = match next {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("{} closed the connection", slot);
                    self.room.depart(slot, Departure::ConnectionLost);
                    return;
                }
                Err(e) => {
                    warn!("{} connection lost: {}", slot, e);
                    self.room.depart(slot, Departure::ConnectionLost);
                    return;
                }
            };
            if !self.handle(&line) {
                return;
            }
        }
    }

    /// Act on one line. Returns `false` once the session is over.
    fn handle(&self, line: &str) -> bool {
        let slot = self.session.slot();
        match line.parse::<ClientMessage>() {
            Ok(ClientMessage::Quit) => {
                self.room.depart(slot, Departure::Quit);
                false
            }
            Ok(ClientMessage::Chat(text)) => {
                self.room.chat(slot, text);
                true
            }
            Ok(ClientMessage::Move { x, y }) => {
                if let Err(e) = self.room.play(slot, x, y) {
                    self.reply(e.into());
                }
                true
            }
            // Blank lines are ignored.
            Err(ParseError::Empty) => true,
            Err(e) => {
                debug!("{} sent a malformed line {:?}: {}", slot, line, e);
                self.reply(e.into());
                true
            }
        }
    }

    fn reply(&self, msg: ServerMessage) {
        if self.session.deliver(msg).is_err() {
            debug!("{} is gone, reply dropped", self.session.slot());
        }
    }
}
