//! Layered runtime configuration.
//!
//! Mirrors the reference storage crate's `Config`/`SyncMode` pattern: a
//! plain struct with a `Default` impl plus named presets, loadable from a
//! TOML file and overridable from the CLI.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capacity of the bounded event-bus channel (§4.5).
    pub event_bus_capacity: usize,
    /// Webhook attempt timeout, in seconds.
    pub webhook_timeout_secs: u64,
    /// Maximum webhook attempts (first try + retries).
    pub webhook_max_attempts: u32,
    /// Minimum weight below which `PruneWeakAttentionEdges` removes an edge.
    pub attention_prune_min_weight: f64,
    /// Minimum query count below which `PruneWeakAttentionEdges` removes an edge.
    pub attention_prune_min_query_count: u64,
    /// Default traversal/subgraph depth when callers omit one.
    pub default_traversal_depth: u32,
    /// Default page size for filter/search results.
    pub default_page_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            event_bus_capacity: 1000,
            webhook_timeout_secs: 30,
            webhook_max_attempts: 3,
            attention_prune_min_weight: 0.1,
            attention_prune_min_query_count: 2,
            default_traversal_depth: 2,
            default_page_limit: 100,
        }
    }
}

impl Config {
    /// Wider event buffer and more patient webhook retries, for deployments
    /// that would rather retain bursty traffic than drop it.
    pub fn high_throughput() -> Self {
        Self {
            event_bus_capacity: 10_000,
            webhook_timeout_secs: 30,
            webhook_max_attempts: 3,
            ..Self::default()
        }
    }

    /// Smaller buffer and tighter pruning thresholds, for constrained or
    /// single-tenant deployments where memory matters more than headroom.
    pub fn conservative() -> Self {
        Self {
            event_bus_capacity: 200,
            attention_prune_min_weight: 0.2,
            attention_prune_min_query_count: 3,
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> crate::error::Result<Self> {
        toml::from_str(s)
            .map_err(|e| crate::error::GraphError::InvalidArgument(format!("invalid config: {e}")))
    }

    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// `$XDG_CONFIG_HOME/memex/config.toml` (or the platform equivalent via
    /// [`dirs::config_dir`]), the CLI's implicit config location when
    /// `--config` is not passed.
    pub fn default_config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|dir| dir.join("memex").join("config.toml"))
    }

    /// Loads from `path` if given, else from [`Self::default_config_path`]
    /// if that file exists, else falls back to [`Config::default`].
    pub fn load(path: Option<&std::path::Path>) -> crate::error::Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match Self::default_config_path() {
            Some(path) if path.is_file() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }
}
