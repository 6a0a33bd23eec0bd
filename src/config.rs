pub const BOARD_SIZE: u8 = 8;
/// Seats per match.
pub const MAX_PLAYERS: usize = 2;

pub const DEFAULT_BIND: &str = "127.0.0.1:12345";

/// Longest client line accepted before the connection is dropped.
pub const DEFAULT_MAX_LINE_LEN: usize = 1024;

/// Upper bound on a single socket write.
pub const DEFAULT_WRITE_TIMEOUT: core::time::Duration = core::time::Duration::from_secs(30);

/// Runtime settings for [`GameServer`](crate::GameServer).
#[cfg(feature = "std")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub max_line_len: usize,
    pub write_timeout: core::time::Duration,
}

#[cfg(feature = "std")]
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_line_len: DEFAULT_MAX_LINE_LEN,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}
