use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info, warn};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::common::Slot;
use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::protocol::ServerMessage;
use crate::room::GameRoom;
use crate::session::{self, Outgoing};
use crate::transport::tcp::TcpTransport;
use crate::transport::{Inbound, Outbound};

/// Accepts connections and seats them in the current [`GameRoom`]. A fresh
/// room replaces the current one once its match has finished.
pub struct GameServer {
    config: ServerConfig,
    room: Mutex<Arc<GameRoom>>,
}

impl GameServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            room: Mutex::new(Arc::new(GameRoom::new())),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The room new connections join.
    pub fn room(&self) -> Arc<GameRoom> {
        let mut room = self.room.lock().unwrap_or_else(PoisonError::into_inner);
        if room.is_finished() {
            info!("previous match finished, opening a new one");
            *room = Arc::new(GameRoom::new());
        }
        Arc::clone(&room)
    }

    /// Seat a connection and spawn its writer and dispatcher tasks. A
    /// connection that finds both seats taken is told so and closed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn admit<R, W>(&self, inbound: R, mut outbound: W) -> Option<Slot>
    where
        R: Inbound + 'static,
        W: Outbound + 'static,
    {
        let room = self.room();
        let (outbox, queue) = session::outbox();
        match room.join(outbox) {
            Ok(session) => {
                let slot = session.slot();
                tokio::spawn(pump(queue, outbound, slot));
                tokio::spawn(Dispatcher::new(room, session, inbound).run());
                Some(slot)
            }
            Err(full) => {
                tokio::spawn(async move {
                    if let Err(e) = outbound.send(&ServerMessage::ServerFull).await {
                        debug!("could not notify rejected connection ({}): {}", full, e);
                    }
                    let _ = outbound.close().await;
                    drop(inbound);
                });
                None
            }
        }
    }

    /// Bind `config.bind` and serve until the listener fails.
    pub async fn run(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.config.bind).await?;
        self.serve(listener).await
    }

    /// Accept loop over an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        info!("listening on {}", listener.local_addr()?);
        loop {
            let (stream, addr) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("accept failed: {}", e);
                    continue;
                }
            };
            info!("connection from {}", addr);
            let (reader, writer) = TcpTransport::with_config(
                stream,
                self.config.max_line_len,
                self.config.write_timeout,
            )
            .into_split();
            self.admit(reader, writer);
        }
    }
}

impl Default for GameServer {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

/// Drain one connection's outbound queue into its socket. Ends on `Close`,
/// on a write error, or when every handle to the queue is gone.
async fn pump<W: Outbound>(mut queue: UnboundedReceiver<Outgoing>, mut outbound: W, slot: Slot) {
    while let Some(item) = queue.recv().await {
        match item {
            Outgoing::Message(msg) => {
                if let Err(e) = outbound.send(&msg).await {
                    warn!("write to {} failed: {}", slot, e);
                    break;
                }
            }
            Outgoing::Close => break,
        }
    }
    // Deliveries to this session fail from here on.
    drop(queue);
    if let Err(e) = outbound.close().await {
        debug!("closing {} failed: {}", slot, e);
    }
}
