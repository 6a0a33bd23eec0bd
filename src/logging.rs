//! Minimal stderr logger behind the `log` facade.
//!
//! Each record prints as `LEVEL target - message`, e.g.
//! `INFO othello::room - Player 1 joined as Black`. Stdout is left to the
//! client's game transcript and the simulator's JSON.

use std::env;

use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable holding the log level.
pub const LOG_ENV: &str = "OTHELLO_LOG";

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{} {} - {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Level named by `raw` (`error`, `warn`, `info`, `debug`, `trace`, `off`,
/// any case), or `info` when absent or unrecognised.
pub fn parse_level(raw: Option<&str>) -> LevelFilter {
    raw.map(str::trim)
        .and_then(|lvl| lvl.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the stderr logger at the level from [`LOG_ENV`]. Calling it again
/// is a no-op.
pub fn init_logging() {
    let level = parse_level(env::var(LOG_ENV).ok().as_deref());
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
