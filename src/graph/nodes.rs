use super::graphdb::GraphCore;
use crate::cancel::CancelSignal;
use crate::error::{GraphError, Result};
use crate::identity;
use crate::model::{Event, EventType, Node};
use serde_json::Map;
use time::OffsetDateTime;

impl GraphCore {
    /// `CreateNode(n)` (§4.2): `n.id` must be non-empty and not already
    /// present. Persists `version=1`, `is_current=true`, `degree=0`, and
    /// emits `node.created`.
    pub async fn create_node(
        &self,
        id: impl Into<String>,
        node_type: impl Into<String>,
        content: Vec<u8>,
        properties: Map<String, serde_json::Value>,
        cancel: &CancelSignal,
    ) -> Result<Node> {
        cancel.check()?;
        let id = id.into();
        if id.trim().is_empty() {
            return Err(GraphError::InvalidArgument("node id must not be empty".into()));
        }
        let node_type = node_type.into();
        let now = OffsetDateTime::now_utc();
        let node = Node::new_v1(id.clone(), node_type.clone(), content, properties, now);
        self.storage.create_node(node.clone()).await?;
        self.events
            .publish(Event::node(EventType::NodeCreated, id, node_type));
        Ok(node)
    }

    /// Content-addressed ingestion: mints a Source id from `content`'s
    /// SHA-256, and dedups identical bytes onto the existing node rather
    /// than erroring (§3, "Re-ingesting identical bytes returns the
    /// existing id").
    pub async fn ingest_source(
        &self,
        content: Vec<u8>,
        properties: Map<String, serde_json::Value>,
        cancel: &CancelSignal,
    ) -> Result<Node> {
        cancel.check()?;
        let id = identity::source_id(&content);
        if let Some(existing) = self.storage.get_node_current(&id).await? {
            return Ok(existing);
        }
        self.create_node(id, "Source", content, properties, cancel).await
    }

    /// `GetNode(id)` (§4.2): the current non-deleted version.
    pub async fn get_node(&self, id: &str) -> Result<Node> {
        match self.storage.get_node_current(id).await? {
            Some(node) if !node.deleted => Ok(node),
            _ => Err(GraphError::NotFound(id.to_string())),
        }
    }

    /// `GetNodeAtVersion(id, v)` (§4.2): that version, deleted or not.
    pub async fn get_node_at_version(&self, id: &str, version: u64) -> Result<Node> {
        if version < 1 {
            return Err(GraphError::InvalidArgument("version must be >= 1".into()));
        }
        self.storage
            .get_node_by_version(id, version)
            .await?
            .ok_or_else(|| GraphError::NotFound(format!("{id}:v{version}")))
    }

    /// `GetNodeAtTime(id, t)` (§4.2): latest version with `modified_at <=
    /// t` (§8 invariant 7 ties this to `get_node_at_version`).
    pub async fn get_node_at_time(&self, id: &str, at: OffsetDateTime) -> Result<Node> {
        self.storage
            .get_node_at_time(id, at)
            .await?
            .ok_or_else(|| GraphError::NotFound(id.to_string()))
    }

    /// `GetNodeHistory(id)` (§4.2): all versions, `version` descending.
    pub async fn get_node_history(&self, id: &str) -> Result<Vec<Node>> {
        let versions = self.storage.list_versions_of(id).await?;
        if versions.is_empty() {
            return Err(GraphError::NotFound(id.to_string()));
        }
        Ok(versions)
    }

    /// `UpdateNodeMeta(id, Δmeta, note, by)` (§4.2): merges `delta` into the
    /// previous version's properties, writes version `V+1` as current,
    /// de-currents `V`, inserts the chain entry, and emits `node.updated`.
    /// Rejects Source nodes unless `force` (§3).
    pub async fn update_node_meta(
        &self,
        id: &str,
        delta: Map<String, serde_json::Value>,
        note: Option<String>,
        changed_by: Option<String>,
        force: bool,
        cancel: &CancelSignal,
    ) -> Result<Node> {
        cancel.check()?;
        let current = self
            .storage
            .get_node_current(id)
            .await?
            .ok_or_else(|| GraphError::NotFound(id.to_string()))?;
        if current.deleted {
            return Err(GraphError::NotFound(id.to_string()));
        }
        if current.is_source() && !force {
            return Err(GraphError::ImmutableSource(id.to_string()));
        }

        let now = OffsetDateTime::now_utc();
        let next = current.next_version(delta, note, changed_by, now);
        self.storage
            .insert_version(Some(&current.version_id), next.clone())
            .await?;
        self.events.publish(Event::node(
            EventType::NodeUpdated,
            id.to_string(),
            next.node_type.clone(),
        ));
        Ok(next)
    }

    /// `DeleteNode(id, force)` (§4.2). Without `force`: writes a tombstone
    /// version, preserving history and incident links (open question (i)).
    /// With `force`: hard-removes every version and all incident links,
    /// decrementing neighbours' degrees by the count of removed links.
    /// Rejects Source nodes unless `force` (§3).
    pub async fn delete_node(&self, id: &str, force: bool, cancel: &CancelSignal) -> Result<()> {
        cancel.check()?;
        let current = self
            .storage
            .get_node_current(id)
            .await?
            .ok_or_else(|| GraphError::NotFound(id.to_string()))?;

        if current.is_source() && !force {
            return Err(GraphError::ImmutableSource(id.to_string()));
        }

        if force {
            self.storage.delete_node_hard(id).await?;
        } else {
            if current.deleted {
                return Ok(());
            }
            let now = OffsetDateTime::now_utc();
            let tombstone = current.tombstone(now);
            self.storage
                .insert_version(Some(&current.version_id), tombstone)
                .await?;
        }

        self.events.publish(Event::node(
            EventType::NodeDeleted,
            id.to_string(),
            current.node_type.clone(),
        ));
        Ok(())
    }

    /// `ListNodes()` (§4.2): ids of current non-deleted nodes.
    pub async fn list_nodes(&self) -> Result<Vec<String>> {
        self.storage.list_node_ids().await
    }
}
