//! The storage driver interface (§6).
//!
//! This is the only storage-side contract the graph core, attention engine,
//! and subscription matcher depend on. Concrete drivers — an embedded
//! B-tree/relational engine, or a remote labelled-property-graph engine —
//! are external collaborators per the specification's scope and are not
//! implemented here; [`memory::MemoryStore`] is a reference driver used to
//! make the core runnable and testable in this repository, in the spirit of
//! the reference crate's alternate-backend adapters.

pub mod memory;

use crate::error::Result;
use crate::model::{Link, Node};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// A `(newer_version_id, older_version_id)` pair forming the per-id version
/// forest (§3, "VersionChain entry").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    pub newer_version_id: String,
    pub older_version_id: String,
}

/// Outcome of an attempted full-text search: a driver that has no FTS
/// engine (or whose index is corrupt/rebuilding) returns `Unsupported` so
/// the graph core can fall back to substring matching (§4.2, "Full-text
/// behaviour").
pub enum SearchOutcome {
    /// Ranked node ids, best match first.
    Ranked(Vec<String>),
    Unsupported,
}

/// Outcome of `execute_read_only_query`: `Unsupported` drives
/// `UNSUPPORTED_QUERY` at subscription-registration time (§4.4).
pub enum QueryOutcome {
    Rows(Vec<Value>),
    Unsupported,
}

/// The storage-side contract (§6). All methods are `async` so a remote
/// driver can perform network I/O without blocking an executor thread.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    async fn create_node(&self, node: Node) -> Result<()>;
    async fn get_node_current(&self, id: &str) -> Result<Option<Node>>;
    async fn get_node_by_version(&self, id: &str, version: u64) -> Result<Option<Node>>;
    async fn get_node_at_time(&self, id: &str, at: OffsetDateTime) -> Result<Option<Node>>;
    async fn list_versions_of(&self, id: &str) -> Result<Vec<Node>>;
    async fn get_version_chain(&self, id: &str) -> Result<Vec<ChainEntry>>;

    /// Atomically inserts `new_node` as the current version, de-currents
    /// `previous_version_id`'s row (if any), and records the chain entry.
    /// Either everything commits or nothing does (§4.2, "Version-chain
    /// semantics").
    async fn insert_version(
        &self,
        previous_version_id: Option<&str>,
        new_node: Node,
    ) -> Result<()>;

    /// Hard-removes every version of `id` and every link incident to it,
    /// returning the number of removed links keyed by the surviving
    /// neighbour id so the caller can decrement degrees.
    async fn delete_node_hard(&self, id: &str) -> Result<BTreeMap<String, u64>>;

    async fn create_link(&self, link: Link) -> Result<()>;
    async fn delete_link(&self, source: &str, target: &str, link_type: &str) -> Result<bool>;
    async fn get_links_from_source(&self, id: &str) -> Result<Vec<Link>>;
    async fn get_links_to_target(&self, id: &str) -> Result<Vec<Link>>;
    async fn list_all_links(&self) -> Result<Vec<Link>>;
    async fn delete_links(&self, keys: &[(String, String, String)]) -> Result<u64>;

    /// Atomic read-modify-write target for a single link's properties; used
    /// by the attention engine's running-average update (§4.3).
    async fn update_link_properties(
        &self,
        source: &str,
        target: &str,
        link_type: &str,
        new_properties: serde_json::Map<String, Value>,
        now: OffsetDateTime,
    ) -> Result<()>;

    async fn list_node_ids(&self) -> Result<Vec<String>>;

    async fn search_by_text(&self, query: &str, limit: usize, offset: usize) -> Result<SearchOutcome>;

    async fn filter_by_type_and_property_substring(
        &self,
        types: &[String],
        substring: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<String>>;

    async fn traverse_outgoing(
        &self,
        start: &str,
        max_depth: u32,
        type_filter: &[String],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<String>>;

    async fn count_nodes_grouped_by_type(&self) -> Result<BTreeMap<String, u64>>;
    async fn count_links_grouped_by_type(&self) -> Result<BTreeMap<String, u64>>;
    async fn top_nodes_by_degree(&self, n: usize) -> Result<Vec<(String, u64)>>;
    async fn sample_ids_by_type(&self, node_type: &str, n: usize) -> Result<Vec<String>>;

    async fn execute_read_only_query(
        &self,
        text: &str,
        params: BTreeMap<String, Value>,
    ) -> Result<QueryOutcome>;

    /// Whether this driver has a read-query engine at all (§4.4: "If the
    /// storage driver does not support ad-hoc read queries, any
    /// subscription whose pattern carries a stored query is reported as
    /// `UNSUPPORTED_QUERY` at registration time"). Drivers without one
    /// (like [`memory::MemoryStore`]) override this to `false`; a concrete
    /// driver backed by a real query engine returns `true`.
    fn supports_read_only_queries(&self) -> bool {
        true
    }
}
