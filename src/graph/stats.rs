use super::graphdb::GraphCore;
use crate::error::Result;
use std::collections::BTreeMap;

/// Read-only aggregate queries used by [`crate::admin::stats`] and
/// [`crate::admin::verify`]; thin pass-throughs to the storage driver so
/// neither admin module needs direct access to [`crate::storage::StorageDriver`].
impl GraphCore {
    pub async fn node_counts_by_type(&self) -> Result<BTreeMap<String, u64>> {
        self.storage.count_nodes_grouped_by_type().await
    }

    pub async fn link_counts_by_type(&self) -> Result<BTreeMap<String, u64>> {
        self.storage.count_links_grouped_by_type().await
    }

    pub async fn top_nodes_by_degree(&self, n: usize) -> Result<Vec<(String, u64)>> {
        self.storage.top_nodes_by_degree(n).await
    }

    pub async fn all_links(&self) -> Result<Vec<crate::model::Link>> {
        self.storage.list_all_links().await
    }

    pub async fn version_chain(&self, id: &str) -> Result<Vec<crate::storage::ChainEntry>> {
        self.storage.get_version_chain(id).await
    }
}
