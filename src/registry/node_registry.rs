//! Node Registry
//!
//! The authoritative in-memory set of nodes seen on the mesh. Partial
//! updates (identity-only, position-only) merge into existing records, full
//! updates replace them, and every mutation is announced to observers before
//! the mutating call returns.

use crate::domain::{validate_record, NodeIdentity, NodeNum, NodePosition, NodeRecord};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use super::events::{ChangeKind, NodeEvent};
use super::observers::{NodeObserver, ObserverList, SubscriptionId};

// =============================================================================
// Constants
// =============================================================================

/// Default capacity of the broadcast channel behind `subscribe_channel`
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the node registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Buffered events per channel subscriber before it starts lagging
    pub event_channel_capacity: usize,
    /// Validate records created from partial updates
    pub validate_on_create: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            validate_on_create: true,
        }
    }
}

impl RegistryConfig {
    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.event_channel_capacity == 0 {
            return Err(Error::Configuration(
                "event_channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Sorting
// =============================================================================

/// Field to order a node listing by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSortKey {
    /// Ascending node number
    #[default]
    Number,
    /// Long name, case-insensitive
    LongName,
    /// Short name, case-insensitive
    ShortName,
    /// Most recent position fix first
    LastFix,
}

/// Orders present keys before absent ones
fn present_first<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn name_key(record: &NodeRecord, pick: fn(&NodeIdentity) -> &str) -> Option<String> {
    record
        .identity
        .as_ref()
        .map(|identity| pick(identity).trim())
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase)
}

// =============================================================================
// Statistics
// =============================================================================

/// Mutation counters for the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Records created by any upsert
    pub created: u64,
    /// Existing records replaced by `upsert_full`
    pub replaced: u64,
    pub identity_updates: u64,
    pub position_updates: u64,
    /// Removals that actually deleted a record
    pub removals: u64,
    /// Creates refused by validation
    pub rejected: u64,
    /// Time of the last successful mutation
    pub last_mutation: Option<DateTime<Utc>>,
}

impl RegistryStats {
    fn record(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::Created => self.created += 1,
            ChangeKind::Replaced => self.replaced += 1,
            ChangeKind::IdentityUpdated => self.identity_updates += 1,
            ChangeKind::PositionUpdated => self.position_updates += 1,
            ChangeKind::Removed => {}
        }
        self.last_mutation = Some(Utc::now());
    }
}

// =============================================================================
// Node Registry
// =============================================================================

/// Live registry of mesh nodes keyed by node number
///
/// Mutators take `&mut self`: the registry assumes one writer. Wrap it in
/// [`super::SharedNodeRegistry`] to share it across threads.
#[derive(Debug)]
pub struct NodeRegistry {
    /// Records by node number
    nodes: BTreeMap<NodeNum, NodeRecord>,
    /// Synchronous callback subscribers
    observers: ObserverList,
    /// Channel subscribers
    event_sender: broadcast::Sender<NodeEvent>,
    config: RegistryConfig,
    stats: RegistryStats,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    /// Create an empty registry with the default configuration
    pub fn new() -> Self {
        Self::build(RegistryConfig::default())
    }

    /// Create an empty registry with the given configuration
    pub fn with_config(config: RegistryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: RegistryConfig) -> Self {
        let (event_sender, _) = broadcast::channel(config.event_channel_capacity);
        Self {
            nodes: BTreeMap::new(),
            observers: ObserverList::new(),
            event_sender,
            config,
            stats: RegistryStats::default(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    /// Register a callback invoked synchronously after every mutation
    pub fn subscribe(&mut self, observer: impl NodeObserver + 'static) -> SubscriptionId {
        let id = self.observers.subscribe(observer);
        debug!(subscription = %id, "observer subscribed");
        id
    }

    /// Remove a callback; returns false if it was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let removed = self.observers.unsubscribe(id);
        debug!(subscription = %id, removed, "observer unsubscribed");
        removed
    }

    /// Get an event receiver
    ///
    /// Events are queued before the mutating call returns. A receiver that
    /// falls more than `event_channel_capacity` events behind sees `Lagged`.
    pub fn subscribe_channel(&self) -> broadcast::Receiver<NodeEvent> {
        self.event_sender.subscribe()
    }

    /// Number of callback subscribers
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn emit(&mut self, number: NodeNum, kind: ChangeKind) {
        self.stats.record(kind);
        let event = NodeEvent::new(number, kind);
        debug!(node = %number, kind = %kind, nodes = self.nodes.len(), "node list changed");

        self.observers.notify(&event);
        // No channel receivers is not an error
        let _ = self.event_sender.send(event);
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Insert or wholesale-replace the record at `record.number`
    pub fn upsert_full(&mut self, record: NodeRecord) -> NodeNum {
        let number = record.number;
        let kind = match self.nodes.insert(number, record) {
            Some(_) => ChangeKind::Replaced,
            None => ChangeKind::Created,
        };
        self.emit(number, kind);
        number
    }

    /// Set the identity of a node, creating the record if needed
    ///
    /// An existing record keeps its position. A new record is validated
    /// first and left out of the registry if validation fails.
    pub fn upsert_identity(&mut self, number: NodeNum, identity: NodeIdentity) -> Result<NodeNum> {
        match self.nodes.get_mut(&number) {
            Some(record) => {
                record.identity = Some(identity);
                self.emit(number, ChangeKind::IdentityUpdated);
                Ok(number)
            }
            None => self.create(
                "upsert_identity",
                NodeRecord::new(number).with_identity(identity),
            ),
        }
    }

    /// Set the position of a node, creating the record if needed
    ///
    /// An existing record keeps its identity. A new record is validated
    /// first and left out of the registry if validation fails.
    pub fn upsert_position(&mut self, number: NodeNum, position: NodePosition) -> Result<NodeNum> {
        match self.nodes.get_mut(&number) {
            Some(record) => {
                record.position = Some(position);
                self.emit(number, ChangeKind::PositionUpdated);
                Ok(number)
            }
            None => self.create(
                "upsert_position",
                NodeRecord::new(number).with_position(position),
            ),
        }
    }

    fn create(&mut self, operation: &'static str, record: NodeRecord) -> Result<NodeNum> {
        let number = record.number;
        if self.config.validate_on_create {
            if let Err(source) = validate_record(&record) {
                self.stats.rejected += 1;
                warn!(node = %number, operation, error = %source, "rejected new node record");
                return Err(Error::invalid_node_data(operation, source));
            }
        }

        self.nodes.insert(number, record);
        self.emit(number, ChangeKind::Created);
        Ok(number)
    }

    /// Delete a node if present; always announces the removal
    pub fn remove(&mut self, number: NodeNum) -> NodeNum {
        if self.nodes.remove(&number).is_some() {
            self.stats.removals += 1;
        } else {
            trace!(node = %number, "remove of unknown node");
        }
        self.emit(number, ChangeKind::Removed);
        number
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Get a node by number
    pub fn get(&self, number: NodeNum) -> Option<&NodeRecord> {
        self.nodes.get(&number)
    }

    /// Check if a node exists
    pub fn contains(&self, number: NodeNum) -> bool {
        self.nodes.contains_key(&number)
    }

    /// Read-only view of every record
    ///
    /// Callers should not rely on the iteration order.
    pub fn nodes(&self) -> &BTreeMap<NodeNum, NodeRecord> {
        &self.nodes
    }

    /// Owned copy of every record
    pub fn snapshot(&self) -> Vec<NodeRecord> {
        self.nodes.values().cloned().collect()
    }

    /// All known node numbers
    pub fn numbers(&self) -> Vec<NodeNum> {
        self.nodes.keys().copied().collect()
    }

    /// Records ordered by the given key
    ///
    /// Records lacking the key come last, in node number order.
    pub fn sorted(&self, key: NodeSortKey) -> Vec<&NodeRecord> {
        let mut records: Vec<&NodeRecord> = self.nodes.values().collect();
        match key {
            NodeSortKey::Number => {}
            NodeSortKey::LongName => records.sort_by(|a, b| {
                present_first(name_key(a, |i| i.long_name.as_str()), name_key(b, |i| i.long_name.as_str()))
            }),
            NodeSortKey::ShortName => records.sort_by(|a, b| {
                present_first(name_key(a, |i| i.short_name.as_str()), name_key(b, |i| i.short_name.as_str()))
            }),
            NodeSortKey::LastFix => records.sort_by_key(|r| {
                let time = r.position.as_ref().and_then(|p| p.time);
                (time.is_none(), Reverse(time))
            }),
        }
        records
    }

    /// Number of the first node announcing the given identity id
    ///
    /// Ids are not unique on the mesh; when several nodes claim the same id
    /// one of them is returned.
    pub fn number_for_identity_id(&self, identity_id: &str) -> Option<NodeNum> {
        let found = self
            .nodes
            .values()
            .find(|record| record.identity.as_ref().is_some_and(|i| i.id == identity_id))
            .map(|record| record.number);
        if found.is_none() {
            trace!(identity_id, "no node with identity id");
        }
        found
    }

    /// Identity id of a node, if the node exists and announced one
    pub fn identity_id_for_number(&self, number: NodeNum) -> Option<&str> {
        self.nodes.get(&number).and_then(NodeRecord::identity_id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get mutation statistics
    pub fn stats(&self) -> RegistryStats {
        self.stats
    }
}
