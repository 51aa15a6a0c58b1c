//! Logging setup for the binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to whoever embeds it.

use crate::error::{Result, SortDirError};
use tracing_subscriber::{fmt, EnvFilter};

/// Level used when neither `RUST_LOG` nor `-v` says otherwise
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Maps the number of `-v` flags to a level
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => DEFAULT_LOG_LEVEL,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global fmt subscriber writing to stderr.
///
/// `RUST_LOG` wins over `verbosity` when it is set.
pub fn init_logging(verbosity: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| SortDirError::Logging(e.to_string()))
}
