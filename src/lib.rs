//! # Memex — a versioned property graph with attention-edge learning
//!
//! Memex is an embeddable graph core that layers three things on top of a
//! pluggable [`storage::StorageDriver`]:
//!
//! - a **copy-on-write versioned node store** with content-addressed,
//!   immutable `Source` nodes and mutable derived nodes (§3, §4.2);
//! - an **attention-edge learning** mechanism that turns "this query found
//!   that node useful" signals into a running-average edge weight (§4.3);
//! - a **standing-subscription engine** that matches graph events against
//!   registered patterns and delivers them over webhooks or WebSockets
//!   (§4.4–§4.7).
//!
//! ## Quick start
//!
//! ```rust
//! use memex::{cancel::CancelSignal, config::Config, events::EventBus, graph::GraphCore, storage::memory::MemoryStore};
//! use serde_json::Map;
//! use std::sync::Arc;
//!
//! # async fn run() -> memex::error::Result<()> {
//! let (bus, _receiver) = EventBus::new(Config::default().event_bus_capacity);
//! let graph = GraphCore::new(Arc::new(MemoryStore::new()), bus, Config::default());
//! let cancel = CancelSignal::inert();
//!
//! let note = graph.create_node("n1", "Note", Vec::new(), Map::new(), &cancel).await?;
//! assert_eq!(note.version, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **Model** ([`model`]): the plain, serde-derived `Node`/`Link`/`Event`
//!   types shared across every other module.
//! - **Storage** ([`storage`]): the `StorageDriver` contract; only
//!   [`storage::memory::MemoryStore`] is provided in-tree as a reference
//!   driver, since a concrete production driver is out of this crate's
//!   scope (§1, §6).
//! - **Graph** ([`graph`]): the versioned node/link store and its query
//!   surface (filter, search, traversal, subgraph extraction).
//! - **Attention** ([`attention`]): `ATTENDED`-edge learning and pruning.
//! - **Events** ([`events`]): the bounded, non-blocking event bus.
//! - **Subscriptions** ([`subscriptions`]): pattern matching, registration,
//!   and delivery.
//! - **Admin** ([`admin`]): statistics and integrity verification.
//! - **CLI** ([`cli`]): the `memex-admin` command surface.

pub mod admin;
pub mod attention;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod identity;
pub mod logging;
pub mod model;
pub mod storage;
pub mod subscriptions;

// Re-export the main public API.
pub use crate::config::Config;
pub use crate::error::{GraphError, Result};
pub use crate::graph::{FilterQuery, GraphCore, Subgraph};
pub use crate::model::{Event, EventType, Link, Node, Notification, Subscription};
