use crate::config::Config;
use crate::events::EventBus;
use crate::storage::StorageDriver;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub(crate) type LinkKey = (String, String, String);

/// The versioned graph store. Owns no storage bytes itself — every
/// operation delegates to a [`StorageDriver`] and, on success, publishes an
/// [`crate::model::Event`] onto the shared [`EventBus`] (§2, "Data flow of
/// a write").
///
/// No singleton pattern is used (§9, "Global subscription cache"):
/// construct one and inject it wherever graph operations are needed.
#[derive(Clone)]
pub struct GraphCore {
    pub(crate) storage: Arc<dyn StorageDriver>,
    pub(crate) events: EventBus,
    pub(crate) config: Config,
    /// Per-edge mutexes serializing attention-weight read-modify-write
    /// cycles (§4.3, §5 "Attention-edge contention") without taking a
    /// store-wide lock for the whole update.
    pub(crate) attention_locks: Arc<DashMap<LinkKey, Arc<Mutex<()>>>>,
}

impl GraphCore {
    pub fn new(storage: Arc<dyn StorageDriver>, events: EventBus, config: Config) -> Self {
        Self {
            storage,
            events,
            config,
            attention_locks: Arc::new(DashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Count of events dropped by the bus for being full (§4.5, §8
    /// invariant 8); surfaced in [`crate::admin::stats::stats`].
    pub fn events_dropped(&self) -> u64 {
        self.events.dropped_count()
    }

    /// Whether the underlying storage driver can evaluate stored queries
    /// at all (§4.4); used at subscription-registration time.
    pub fn supports_stored_queries(&self) -> bool {
        self.storage.supports_read_only_queries()
    }

    pub(crate) fn attention_lock(&self, key: &LinkKey) -> Arc<Mutex<()>> {
        self.attention_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
