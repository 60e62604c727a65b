use super::graphdb::GraphCore;
use crate::cancel::CancelSignal;
use crate::error::Result;
use crate::model::{Event, Node};
use crate::storage::{QueryOutcome, SearchOutcome};
use std::collections::BTreeMap;

/// `FilterNodes` criteria (§4.2): all fields are ANDed together; an empty
/// `types` list means "any type".
#[derive(Debug, Clone, Default)]
pub struct FilterQuery {
    pub types: Vec<String>,
    pub property_substring: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

impl FilterQuery {
    pub fn new() -> Self {
        Self {
            limit: 100,
            ..Default::default()
        }
    }

    pub fn with_types(mut self, types: Vec<String>) -> Self {
        self.types = types;
        self
    }

    pub fn with_property_substring(mut self, substring: impl Into<String>) -> Self {
        self.property_substring = Some(substring.into());
        self
    }

    pub fn with_page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

impl GraphCore {
    /// `FilterNodes(query)` (§4.2): structural filtering by type and a
    /// property-value substring, independent of full-text search.
    pub async fn filter_nodes(&self, query: &FilterQuery, cancel: &CancelSignal) -> Result<Vec<Node>> {
        cancel.check()?;
        let ids = self
            .storage
            .filter_by_type_and_property_substring(
                &query.types,
                query.property_substring.as_deref(),
                query.limit,
                query.offset,
            )
            .await?;
        self.hydrate(ids).await
    }

    /// `SearchNodes(query, limit, offset)` (§4.2, "Full-text behaviour"):
    /// prefers the driver's full-text index; when the driver reports
    /// `Unsupported` (no FTS engine, or an unusable index), falls back to a
    /// case-sensitive substring match over `id`, `type`, `content`, and
    /// `properties` — the same four fields the index covers — so the
    /// fallback's result set is a superset of the indexed one rather than a
    /// narrower slice of it.
    pub async fn search_nodes(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
        cancel: &CancelSignal,
    ) -> Result<Vec<Node>> {
        cancel.check()?;
        let nodes = match self.storage.search_by_text(query, limit, offset).await? {
            SearchOutcome::Ranked(ids) => self.hydrate(ids).await?,
            SearchOutcome::Unsupported => self.substring_search_fallback(query, limit, offset).await?,
        };
        Ok(nodes)
    }

    /// Scans every current, non-deleted node and keeps those whose `id`,
    /// `type`, `content` (lossily decoded), or serialized `properties`
    /// contain `query` as a substring.
    async fn substring_search_fallback(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Node>> {
        let mut matches = Vec::new();
        for id in self.storage.list_node_ids().await? {
            let Some(node) = self.storage.get_node_current(&id).await? else {
                continue;
            };
            if node.deleted {
                continue;
            }
            let content = String::from_utf8_lossy(&node.content);
            let properties = serde_json::to_string(&node.properties).unwrap_or_default();
            if node.id.contains(query)
                || node.node_type.contains(query)
                || content.contains(query)
                || properties.contains(query)
            {
                matches.push(node);
            }
        }
        Ok(matches.into_iter().skip(offset).take(limit).collect())
    }

    /// Runs a subscription's stored query against the storage driver
    /// (§4.4), binding the triggering event's `node_id`, `node_type`,
    /// `link_source`, `link_target`, and `link_type` as named parameters
    /// (§4.4 step 3). A driver with no ad-hoc read-query engine reports
    /// `Unsupported`.
    pub async fn execute_stored_query(&self, text: &str, event: &Event) -> Result<QueryOutcome> {
        let mut params = BTreeMap::new();
        if let Some(v) = &event.node_id {
            params.insert("node_id".to_string(), serde_json::Value::String(v.clone()));
        }
        if let Some(v) = &event.node_type {
            params.insert("node_type".to_string(), serde_json::Value::String(v.clone()));
        }
        if let Some(v) = &event.link_source {
            params.insert("link_source".to_string(), serde_json::Value::String(v.clone()));
        }
        if let Some(v) = &event.link_target {
            params.insert("link_target".to_string(), serde_json::Value::String(v.clone()));
        }
        if let Some(v) = &event.link_type {
            params.insert("link_type".to_string(), serde_json::Value::String(v.clone()));
        }
        self.storage.execute_read_only_query(text, params).await
    }

    async fn hydrate(&self, ids: Vec<String>) -> Result<Vec<Node>> {
        let mut nodes = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(node) = self.storage.get_node_current(&id).await? {
                if !node.deleted {
                    nodes.push(node);
                }
            }
        }
        Ok(nodes)
    }
}
