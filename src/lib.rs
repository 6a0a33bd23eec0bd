#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod bitboard;
mod board;
mod common;
mod config;
mod error;
mod game;
pub mod protocol;
#[cfg(feature = "std")]
mod broadcast;
#[cfg(feature = "std")]
mod dispatcher;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod prelude;
#[cfg(feature = "std")]
mod room;
#[cfg(feature = "std")]
mod server;
#[cfg(feature = "std")]
pub mod session;
#[cfg(feature = "std")]
pub mod transport;

pub use bitboard::{BitBoard, BitBoardError};
pub use board::*;
pub use common::*;
pub use config::*;
pub use error::*;
pub use game::*;
pub use protocol::{ClientMessage, ServerMessage};
#[cfg(feature = "std")]
pub use broadcast::fan_out;
#[cfg(feature = "std")]
pub use dispatcher::Dispatcher;
#[cfg(feature = "std")]
pub use logging::{init_logging, parse_level, LOG_ENV};
#[cfg(feature = "std")]
pub use room::{Departure, GameRoom};
#[cfg(feature = "std")]
pub use server::GameServer;
#[cfg(feature = "std")]
pub use session::{Session, SessionRegistry};
#[cfg(feature = "std")]
pub use transport::tcp::TcpTransport;
