//! Mesh Node Registry
//!
//! The in-memory picture of every device seen on a mesh radio network: who
//! each node is, where it last reported itself, and a change feed for anyone
//! rendering or routing on top of that picture.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   upsert_* / remove   ┌─────────────────────────────┐
//! │  Protocol decoder │ ────────────────────▶ │        NodeRegistry         │
//! │  (or replay file) │                       │  BTreeMap<NodeNum, Record>  │
//! └──────────────────┘                       └──────────────┬──────────────┘
//!                                                           │ NodeEvent
//!                                             ┌─────────────┴─────────────┐
//!                                             │ observers  │  broadcast   │
//!                                             └─────────────┬─────────────┘
//!                                                           │ re-query
//!                                                      UI / routing
//! ```
//!
//! # Modules
//!
//! - [`domain`]: Node records, identity and position payloads, validation
//! - [`registry`]: The registry, its events, and observer plumbing
//! - [`replay`]: JSON-lines boundary for already-decoded updates
//! - [`error`]: Error types and handling

pub mod domain;
pub mod error;
pub mod registry;
pub mod replay;

// Re-export commonly used types
pub use domain::{NodeIdentity, NodeNum, NodePosition, NodeRecord, ValidationError};

pub use error::{Error, Result};

pub use registry::{
    ChangeKind, NodeEvent, NodeObserver, NodeRegistry, NodeSortKey, RegistryConfig,
    RegistryStats, SharedNodeRegistry, SubscriptionId,
};

pub use replay::{replay_lines, NodeUpdate, ReplaySummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
