use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::protocol::{ClientMessage, ServerMessage};
use crate::transport::{Inbound, Outbound};

/// An in-process connection: the client end plus the two server halves.
pub struct InMemoryConnection;

impl InMemoryConnection {
    pub fn pair() -> (InMemoryClient, InMemoryReader, InMemoryWriter) {
        let (to_server, server_rx) = unbounded_channel();
        let (server_tx, from_server) = unbounded_channel();
        (
            InMemoryClient {
                to_server: Some(to_server),
                from_server,
            },
            InMemoryReader { rx: server_rx },
            InMemoryWriter {
                tx: Some(server_tx),
            },
        )
    }
}

/// Client end of an [`InMemoryConnection`]. Server output arrives one line at
/// a time, exactly as a TCP client would read it.
pub struct InMemoryClient {
    to_server: Option<UnboundedSender<String>>,
    from_server: UnboundedReceiver<String>,
}

impl InMemoryClient {
    pub fn send_line(&self, line: impl Into<String>) -> anyhow::Result<()> {
        let tx = self
            .to_server
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Client is disconnected"))?;
        tx.send(line.into())
            .map_err(|_| anyhow::anyhow!("Connection closed by peer"))
    }

    pub fn send(&self, msg: &ClientMessage) -> anyhow::Result<()> {
        self.send_line(msg.to_string())
    }

    /// Next server line; `None` once the server closed and the queue drained.
    pub async fn next_line(&mut self) -> Option<String> {
        self.from_server.recv().await
    }

    /// Next server line if one is already queued.
    pub fn try_next_line(&mut self) -> Option<String> {
        self.from_server.try_recv().ok()
    }

    /// Drop the sending direction, as if the socket was closed.
    pub fn disconnect(&mut self) {
        self.to_server = None;
    }
}

pub struct InMemoryReader {
    rx: UnboundedReceiver<String>,
}

#[async_trait::async_trait]
impl Inbound for InMemoryReader {
    async fn recv_line(&mut self) -> anyhow::Result<Option<String>> {
        Ok(self.rx.recv().await)
    }
}

pub struct InMemoryWriter {
    tx: Option<UnboundedSender<String>>,
}

#[async_trait::async_trait]
impl Outbound for InMemoryWriter {
    async fn send(&mut self, msg: &ServerMessage) -> anyhow::Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Transport is shut down"))?;
        for line in msg.to_string().lines() {
            tx.send(line.to_owned())
                .map_err(|_| anyhow::anyhow!("Connection closed by peer"))?;
        }
        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.tx = None;
        Ok(())
    }
}
