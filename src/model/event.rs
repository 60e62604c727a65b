use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

/// The five mutation kinds that drive the event bus (§3, "Event").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[serde(rename = "node.created")]
    NodeCreated,
    #[serde(rename = "node.updated")]
    NodeUpdated,
    #[serde(rename = "node.deleted")]
    NodeDeleted,
    #[serde(rename = "link.created")]
    LinkCreated,
    #[serde(rename = "link.deleted")]
    LinkDeleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::NodeCreated => "node.created",
            EventType::NodeUpdated => "node.updated",
            EventType::NodeDeleted => "node.deleted",
            EventType::LinkCreated => "link.created",
            EventType::LinkDeleted => "link.deleted",
        }
    }

    pub fn is_node_event(&self) -> bool {
        matches!(
            self,
            EventType::NodeCreated | EventType::NodeUpdated | EventType::NodeDeleted
        )
    }

    pub fn is_link_event(&self) -> bool {
        matches!(self, EventType::LinkCreated | EventType::LinkDeleted)
    }
}

/// In-memory-only mutation envelope (§3, "Event"); never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty", default)]
    pub meta: Map<String, Value>,
}

impl Event {
    pub fn node(event_type: EventType, node_id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            timestamp: OffsetDateTime::now_utc(),
            node_id: Some(node_id.into()),
            node_type: Some(node_type.into()),
            link_source: None,
            link_target: None,
            link_type: None,
            meta: Map::new(),
        }
    }

    pub fn link(
        event_type: EventType,
        source: impl Into<String>,
        target: impl Into<String>,
        link_type: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            timestamp: OffsetDateTime::now_utc(),
            node_id: None,
            node_type: None,
            link_source: Some(source.into()),
            link_target: Some(target.into()),
            link_type: Some(link_type.into()),
            meta: Map::new(),
        }
    }
}
