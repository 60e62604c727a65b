use super::graphdb::GraphCore;
use crate::cancel::CancelSignal;
use crate::error::{GraphError, Result};
use crate::model::{Event, EventType, Link};
use serde_json::{Map, Value};
use time::OffsetDateTime;

impl GraphCore {
    /// `CreateLink(source, target, type, props)` (§4.2): both endpoints
    /// must exist as current nodes; the `(source, target, type)` triple
    /// must be unique (§8 invariant 3). Bumps both endpoints' `degree` and
    /// emits `link.created`.
    pub async fn create_link(
        &self,
        source_id: &str,
        target_id: &str,
        link_type: impl Into<String>,
        properties: Map<String, Value>,
        cancel: &CancelSignal,
    ) -> Result<Link> {
        cancel.check()?;
        self.require_current(source_id).await?;
        self.require_current(target_id).await?;

        let link_type = link_type.into();
        let now = OffsetDateTime::now_utc();
        let link = Link::new(source_id, target_id, link_type.clone(), properties, now);
        self.storage.create_link(link.clone()).await?;
        self.events.publish(Event::link(
            EventType::LinkCreated,
            source_id.to_string(),
            target_id.to_string(),
            link_type,
        ));
        Ok(link)
    }

    /// `DeleteLink(source, target, type)` (§4.2): decrements both
    /// endpoints' `degree` and emits `link.deleted`. A no-op (not an error)
    /// if the link does not exist.
    pub async fn delete_link(
        &self,
        source_id: &str,
        target_id: &str,
        link_type: &str,
        cancel: &CancelSignal,
    ) -> Result<()> {
        cancel.check()?;
        let removed = self.storage.delete_link(source_id, target_id, link_type).await?;
        if removed {
            self.events.publish(Event::link(
                EventType::LinkDeleted,
                source_id.to_string(),
                target_id.to_string(),
                link_type.to_string(),
            ));
        }
        Ok(())
    }

    /// `GetLinks(id, direction)` (§4.2): `"out"` returns links with `id` as
    /// source, `"in"` returns links with `id` as target, anything else
    /// (including `"both"`) returns the union.
    pub async fn get_links(&self, id: &str, direction: &str) -> Result<Vec<Link>> {
        match direction {
            "out" => self.storage.get_links_from_source(id).await,
            "in" => self.storage.get_links_to_target(id).await,
            _ => {
                let mut out = self.storage.get_links_from_source(id).await?;
                out.extend(self.storage.get_links_to_target(id).await?);
                Ok(out)
            }
        }
    }

    pub(crate) async fn require_current(&self, id: &str) -> Result<()> {
        match self.storage.get_node_current(id).await? {
            Some(node) if !node.deleted => Ok(()),
            _ => Err(GraphError::NotFound(id.to_string())),
        }
    }
}
