use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// A directed relation between two node ids (§3, "Link (edge)"). Links are
/// not versioned: they are either present or absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub properties: Map<String, Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
}

/// Reserved type string for attention-learned edges (§3, "AttentionEdge").
pub const ATTENDED: &str = "ATTENDED";

impl Link {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        link_type: impl Into<String>,
        properties: Map<String, Value>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            link_type: link_type.into(),
            properties,
            created_at: now,
            modified_at: now,
        }
    }

    /// The `(source_id, target_id, type)` triple that must be unique
    /// across all links (§3 invariant, §8 invariant 3).
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.source_id, &self.target_id, &self.link_type)
    }

    pub fn key_owned(&self) -> (String, String, String) {
        (self.source_id.clone(), self.target_id.clone(), self.link_type.clone())
    }

    pub fn is_attention_edge(&self) -> bool {
        self.link_type == ATTENDED
    }
}

/// Numeric fields carried by an `ATTENDED` link's `properties` (§3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttentionFields {
    pub weight: f64,
    pub query_count: u64,
}

impl AttentionFields {
    pub fn read_from(properties: &Map<String, Value>) -> Option<Self> {
        let weight = properties.get("weight")?.as_f64()?;
        let query_count = properties.get("query_count")?.as_u64()?;
        Some(Self { weight, query_count })
    }

    pub fn write_into(
        self,
        properties: &mut Map<String, Value>,
        last_query_id: &str,
        now: OffsetDateTime,
    ) {
        properties.insert("weight".into(), Value::from(self.weight));
        properties.insert("query_count".into(), Value::from(self.query_count));
        properties.insert("last_query_id".into(), Value::from(last_query_id));
        properties.insert(
            "last_updated".into(),
            Value::from(
                now.format(&time::format_description::well_known::Rfc3339)
                    .unwrap_or_default(),
            ),
        );
    }
}
