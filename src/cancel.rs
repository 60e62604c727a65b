//! Cooperative cancellation for long-running operations (§5, "Cancellation").
//!
//! A thin wrapper around `tokio::sync::watch<bool>` rather than a direct
//! `tokio-util::sync::CancellationToken` dependency, following the reference
//! crate's habit of building small concurrency primitives on top of the
//! `tokio::sync` types it already depends on instead of reaching for another
//! crate for a one-field flag.

use crate::error::{GraphError, Result};
use tokio::sync::watch;

#[derive(Clone)]
pub struct CancelToken {
    tx: watch::Sender<bool>,
}

#[derive(Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> (Self, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelSignal { rx })
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new().0
    }
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Returns `Err(GraphError::Cancelled)` if the token has fired; call at
    /// entry and before each storage round-trip per §5.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(GraphError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// A signal that never cancels, for callers that have no cancellation
    /// scope of their own (tests, the CLI's one-shot commands).
    pub fn inert() -> Self {
        CancelToken::new().1
    }
}
