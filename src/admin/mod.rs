//! Administrative reporting and integrity verification, mirroring the
//! reference storage crate's `admin` module: statistics gathering
//! ([`stats`]) and structural verification ([`verify`]) against a live
//! [`crate::graph::GraphCore`] instead of an on-disk file.

mod stats;
mod verify;

/// Statistics collection and reporting.
pub use stats::{stats, StatsReport};

/// Structural verification against the invariants the graph core
/// maintains (§8).
pub use verify::{verify, VerifyFinding, VerifyLevel, VerifyReport, VerifySeverity};
