//! Structured logging setup.
//!
//! Adapted from the reference storage crate's `logging::init_logging`:
//! initialises a global `tracing` subscriber from an `EnvFilter` string,
//! defaulting to `RUST_LOG` when no explicit level is given.

use crate::error::{GraphError, Result};
use tracing_subscriber::{fmt, EnvFilter};

pub fn init(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| GraphError::InvalidArgument(format!("invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| GraphError::InvalidArgument("logging already initialized".into()))
}

/// Initializes logging from `RUST_LOG`, defaulting to `info` when unset.
pub fn init_default() -> Result<()> {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    init(&level)
}
