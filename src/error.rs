//! Error kinds shared across the graph core, attention engine, and
//! subscription machinery.
//!
//! Mirrors the reference storage crate's convention of one flat
//! `thiserror`-derived enum rather than a per-module error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("duplicate id: {0}")]
    DuplicateId(String),

    #[error("duplicate link: {0} -[{2}]-> {1}")]
    DuplicateLink(String, String, String),

    #[error("{0} is an immutable source node; pass force=true to override")]
    ImmutableSource(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("subscription pattern uses a stored query but the storage driver does not support ad-hoc read queries")]
    UnsupportedQuery,

    #[error("stored query rejected: {0}")]
    ForbiddenQuery(String),

    #[error("concurrent update to {0}, retry")]
    ConcurrentUpdate(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("transient storage failure: {0}")]
    TransientStorage(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GraphError {
    /// The stable error-kind tag used in logs and admin reports; not part of
    /// the `Display` message so callers can match on it without parsing text.
    pub fn kind(&self) -> &'static str {
        match self {
            GraphError::NotFound(_) => "NOT_FOUND",
            GraphError::DuplicateId(_) => "DUPLICATE_ID",
            GraphError::DuplicateLink(..) => "DUPLICATE_LINK",
            GraphError::ImmutableSource(_) => "IMMUTABLE_SOURCE",
            GraphError::InvalidArgument(_) => "INVALID_ARGUMENT",
            GraphError::UnsupportedQuery => "UNSUPPORTED_QUERY",
            GraphError::ForbiddenQuery(_) => "FORBIDDEN_QUERY",
            GraphError::ConcurrentUpdate(_) => "CONCURRENT_UPDATE",
            GraphError::Cancelled => "CANCELLED",
            GraphError::TransientStorage(_) => "TRANSIENT_STORAGE",
            GraphError::Internal(_) | GraphError::Serialization(_) | GraphError::Io(_) => {
                "INTERNAL"
            }
        }
    }
}
