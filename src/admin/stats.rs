//! Aggregate statistics over a live graph, mirroring the reference
//! crate's `admin::stats` report shape but sourced from
//! [`GraphCore`](crate::graph::GraphCore) queries instead of page-level
//! storage counters.

use crate::error::Result;
use crate::graph::GraphCore;
use serde::Serialize;
use std::collections::BTreeMap;

/// Node/link counts grouped by type, plus the highest-degree nodes and the
/// event bus's drop counter — the numbers an operator checks first when
/// asking "is this deployment healthy" (§4.5, §8 invariant 8).
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub nodes_by_type: BTreeMap<String, u64>,
    pub links_by_type: BTreeMap<String, u64>,
    pub total_nodes: u64,
    pub total_links: u64,
    pub top_nodes_by_degree: Vec<(String, u64)>,
    pub events_dropped: u64,
}

/// Gathers a [`StatsReport`] for `graph`. `top_n` bounds how many
/// highest-degree nodes are returned.
pub async fn stats(graph: &GraphCore, top_n: usize) -> Result<StatsReport> {
    let nodes_by_type = graph.node_counts_by_type().await?;
    let links_by_type = graph.link_counts_by_type().await?;
    let total_nodes = nodes_by_type.values().sum();
    let total_links = links_by_type.values().sum();
    let top_nodes_by_degree = graph.top_nodes_by_degree(top_n).await?;

    Ok(StatsReport {
        nodes_by_type,
        links_by_type,
        total_nodes,
        total_links,
        top_nodes_by_degree,
        events_dropped: graph.events_dropped(),
    })
}
