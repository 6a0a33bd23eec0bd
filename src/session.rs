//! Seat bookkeeping for one match.
//!
//! The registry is the only holder of live connection handles. A handle is
//! the sending side of the connection's outbound queue; the queue is drained
//! by a writer task that owns the socket, so pushing to it never blocks.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;

use crate::common::{Color, Slot};
use crate::config::MAX_PLAYERS;
use crate::error::ServerFull;
use crate::protocol::ServerMessage;

/// Item in a connection's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Message(ServerMessage),
    /// Write nothing further and close the connection.
    Close,
}

/// Handle for queueing output to one connection.
pub type Outbox = UnboundedSender<Outgoing>;

/// Create a connection handle and the queue its writer task drains.
pub fn outbox() -> (Outbox, UnboundedReceiver<Outgoing>) {
    mpsc::unbounded_channel()
}

/// The outbound queue's reader is gone; the connection is dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnected;

/// A seated player.
#[derive(Debug, Clone)]
pub struct Session {
    slot: Slot,
    outbox: Outbox,
    closed: Arc<Notify>,
}

impl Session {
    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn color(&self) -> Color {
        self.slot.color()
    }

    /// Whether the connection's writer is still draining the queue.
    pub fn is_connected(&self) -> bool {
        !self.outbox.is_closed()
    }

    /// Queue a message for this connection only.
    pub fn deliver(&self, msg: ServerMessage) -> Result<(), Disconnected> {
        self.outbox
            .send(Outgoing::Message(msg))
            .map_err(|_| Disconnected)
    }

    /// Close the connection after everything already queued is written, and
    /// wake the dispatcher reading it.
    pub fn close(&self) {
        let _ = self.outbox.send(Outgoing::Close);
        self.closed.notify_one();
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.closed.notified().await;
    }
}

#[derive(Default)]
struct Seats {
    seats: [Option<Session>; MAX_PLAYERS],
    /// Set once both seats were filled at the same time; no one joins after.
    sealed: bool,
}

/// Thread-safe seat table. Register, unregister and listing exclude each
/// other behind one lock.
#[derive(Default)]
pub struct SessionRegistry {
    inner: Mutex<Seats>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Seats> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seat a new connection in the lowest free slot.
    pub fn register(&self, outbox: Outbox) -> Result<Session, ServerFull> {
        let mut inner = self.lock();
        if inner.sealed {
            return Err(ServerFull);
        }
        let slot = Slot::ALL
            .into_iter()
            .find(|slot| inner.seats[slot.index()].is_none())
            .ok_or(ServerFull)?;
        let session = Session {
            slot,
            outbox,
            closed: Arc::new(Notify::new()),
        };
        inner.seats[slot.index()] = Some(session.clone());
        if inner.seats.iter().all(Option::is_some) {
            inner.sealed = true;
        }
        Ok(session)
    }

    /// Remove the session in `slot`. `None` if it was already gone, which
    /// makes repeated departures of the same player harmless.
    pub fn unregister(&self, slot: Slot) -> Option<Session> {
        self.lock().seats[slot.index()].take()
    }

    /// Snapshot of the seated sessions for fan-out.
    pub fn list_active(&self) -> Vec<Session> {
        self.lock().seats.iter().flatten().cloned().collect()
    }

    /// Remove every session, returning them so the caller can close them.
    pub fn drain(&self) -> Vec<Session> {
        self.lock().seats.iter_mut().filter_map(Option::take).collect()
    }

    /// Let new connections take free seats again. Used when a player leaves
    /// a match that never started; does nothing while both seats are taken.
    pub fn reopen(&self) {
        let mut inner = self.lock();
        if inner.seats.iter().any(Option::is_none) {
            inner.sealed = false;
        }
    }

    pub fn get(&self, slot: Slot) -> Option<Session> {
        self.lock().seats[slot.index()].clone()
    }

    pub fn len(&self) -> usize {
        self.lock().seats.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Both seats are occupied right now.
    pub fn is_full(&self) -> bool {
        self.len() == MAX_PLAYERS
    }

    /// Whether the match has ever had both seats filled.
    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }
}
