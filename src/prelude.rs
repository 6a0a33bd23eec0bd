//! Commonly used types for ease of import.

pub use crate::{
    Board, ClientMessage, Color, GameEngine, GameRoom, GameServer, MoveError, Phase, Score,
    ServerConfig, ServerMessage, Slot, Square,
};

pub use crate::transport::{
    in_memory::{InMemoryClient, InMemoryConnection},
    tcp::TcpTransport,
    Inbound, Outbound,
};
