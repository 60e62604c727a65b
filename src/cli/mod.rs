//! The `memex-admin` command surface, mirroring the reference crate's
//! habit of defining the full `clap`-derived `Cli`/`Command` tree inside
//! the library so both the binary and integration tests can drive it.
//!
//! Every command opens a fresh in-process [`MemoryStore`] — there is no
//! on-disk persistence here, since the concrete storage driver is outside
//! this crate's scope (§1, §6). This CLI is a reference driver for
//! exercising the graph core end-to-end, not a production administration
//! tool for a real deployment (which would point at its own driver).

use crate::admin::{self, VerifyLevel as AdminVerifyLevel};
use crate::cancel::CancelSignal;
use crate::config::Config;
use crate::error::Result;
use crate::events::EventBus;
use crate::graph::GraphCore;
use crate::storage::memory::MemoryStore;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Map;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "memex-admin", version, about = "Administrative CLI for the memex graph store")]
pub struct Cli {
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Path to a TOML config file; falls back to the platform config
    /// directory, then to built-in defaults (see [`Config::load`]).
    #[arg(long, global = true, env = "MEMEX_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Creates a node and prints its id and version.
    CreateNode {
        id: String,
        #[arg(long, default_value = "Note")]
        node_type: String,
        #[arg(long)]
        properties: Option<String>,
    },
    /// Fetches the current version of a node.
    GetNode { id: String },
    /// Creates a link between two existing nodes.
    CreateLink {
        source: String,
        target: String,
        #[arg(long, default_value = "RELATED_TO")]
        link_type: String,
    },
    /// Breadth-first traversal along outgoing links.
    Traverse {
        start: String,
        #[arg(long, default_value_t = 2)]
        depth: u32,
    },
    /// Reports aggregate node/link counts and the highest-degree nodes.
    Stats {
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Checks the graph's structural invariants.
    Verify {
        #[arg(long, default_value_t = false)]
        full: bool,
    },
    /// Removes weak `ATTENDED` edges below the given thresholds. Thresholds
    /// default to the loaded config's `attention_prune_min_weight` /
    /// `attention_prune_min_query_count` when omitted.
    PruneAttention {
        #[arg(long)]
        min_weight: Option<f64>,
        #[arg(long)]
        min_query_count: Option<u64>,
    },
}

impl Cli {
    /// Runs the parsed command against a freshly constructed in-memory
    /// graph, printing a result in the requested [`OutputFormat`].
    pub async fn run(self) -> Result<()> {
        let format = self.format;
        let config = Config::load(self.config.as_deref())?;
        let (bus, _receiver) = EventBus::new(config.event_bus_capacity);
        let graph = GraphCore::new(Arc::new(MemoryStore::new()), bus, config);
        let cancel = CancelSignal::inert();

        match self.command {
            Command::CreateNode { id, node_type, properties } => {
                let properties = parse_properties(properties.as_deref())?;
                let node = graph.create_node(id, node_type, Vec::new(), properties, &cancel).await?;
                print_result(&node, format)?;
            }
            Command::GetNode { id } => {
                let node = graph.get_node(&id).await?;
                print_result(&node, format)?;
            }
            Command::CreateLink { source, target, link_type } => {
                let link = graph
                    .create_link(&source, &target, link_type, Map::new(), &cancel)
                    .await?;
                print_result(&link, format)?;
            }
            Command::Traverse { start, depth } => {
                let ids = graph.traverse_graph(&start, depth, &[], usize::MAX, 0, &cancel).await?;
                print_result(&ids, format)?;
            }
            Command::Stats { top } => {
                let report = admin::stats(&graph, top).await?;
                print_result(&report, format)?;
            }
            Command::Verify { full } => {
                let level = if full { AdminVerifyLevel::Full } else { AdminVerifyLevel::Fast };
                let report = admin::verify(&graph, level).await?;
                print_result(&report, format)?;
            }
            Command::PruneAttention { min_weight, min_query_count } => {
                let min_weight = min_weight.unwrap_or(graph.config().attention_prune_min_weight);
                let min_query_count =
                    min_query_count.unwrap_or(graph.config().attention_prune_min_query_count);
                let removed = graph
                    .prune_weak_attention_edges(min_weight, min_query_count, &cancel)
                    .await?;
                print_result(&removed, format)?;
            }
        }
        Ok(())
    }
}

fn print_result<T: serde::Serialize + std::fmt::Debug>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Text => {
            println!("{value:#?}");
        }
    }
    Ok(())
}

fn parse_properties(raw: Option<&str>) -> Result<Map<String, serde_json::Value>> {
    match raw {
        None => Ok(Map::new()),
        Some(text) => match serde_json::from_str(text)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(crate::error::GraphError::InvalidArgument(
                "--properties must be a JSON object".into(),
            )),
        },
    }
}
