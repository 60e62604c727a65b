use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// A vertex with a stable external id and a monotonically increasing
/// version (§3, "Node").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub version: u64,
    pub version_id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(with = "serde_content_hex")]
    pub content: Vec<u8>,
    pub properties: Map<String, Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
    pub deleted: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
    pub change_note: Option<String>,
    pub changed_by: Option<String>,
    pub degree: u64,
    pub is_current: bool,
}

impl Node {
    /// Builds version 1 of a brand-new node. Callers provide `id`,
    /// `node_type`, `content`, and `properties`; every other field is
    /// server-assigned (§4.2, `CreateNode`).
    pub fn new_v1(
        id: impl Into<String>,
        node_type: impl Into<String>,
        content: Vec<u8>,
        properties: Map<String, Value>,
        now: OffsetDateTime,
    ) -> Self {
        let id = id.into();
        Self {
            version_id: crate::identity::version_id(&id, 1),
            id,
            version: 1,
            node_type: node_type.into(),
            content,
            properties,
            created_at: now,
            modified_at: now,
            deleted: false,
            deleted_at: None,
            change_note: None,
            changed_by: None,
            degree: 0,
            is_current: true,
        }
    }

    /// Whether this node's id marks it as an immutable Source node (§3).
    pub fn is_source(&self) -> bool {
        crate::identity::is_source_id(&self.id)
    }

    /// A new version descending from `self`, carrying forward `content`,
    /// `type`, `created_at`, and `degree` while merging `delta` into
    /// `properties` (§4.2, `UpdateNodeMeta`).
    pub fn next_version(
        &self,
        delta: Map<String, Value>,
        note: Option<String>,
        changed_by: Option<String>,
        now: OffsetDateTime,
    ) -> Self {
        let mut properties = self.properties.clone();
        for (k, v) in delta {
            properties.insert(k, v);
        }
        let version = self.version + 1;
        Self {
            version_id: crate::identity::version_id(&self.id, version),
            id: self.id.clone(),
            version,
            node_type: self.node_type.clone(),
            content: self.content.clone(),
            properties,
            created_at: self.created_at,
            modified_at: now,
            deleted: false,
            deleted_at: None,
            change_note: note,
            changed_by,
            degree: self.degree,
            is_current: true,
        }
    }

    /// A tombstone version: empty content/properties, `deleted=true` (§3).
    pub fn tombstone(&self, now: OffsetDateTime) -> Self {
        let version = self.version + 1;
        Self {
            version_id: crate::identity::version_id(&self.id, version),
            id: self.id.clone(),
            version,
            node_type: self.node_type.clone(),
            content: Vec::new(),
            properties: Map::new(),
            created_at: self.created_at,
            modified_at: now,
            deleted: true,
            deleted_at: Some(now),
            change_note: None,
            changed_by: None,
            degree: self.degree,
            is_current: true,
        }
    }
}

/// Serializes `content` as hex so `Node` round-trips through JSON (used
/// by the subscription-persistence layout and the admin CLI's export path)
/// without assuming UTF-8 content bytes.
mod serde_content_hex {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        hex::encode(bytes).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
