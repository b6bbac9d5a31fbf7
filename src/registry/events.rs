//! Registry Events
//!
//! Events emitted by the node registry after every mutation so that
//! observers can refresh their view of the node list.

use serde::{Deserialize, Serialize};

use crate::domain::NodeNum;

/// What happened to the node named in a [`NodeEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A record was created for a previously unseen number
    Created,
    /// An existing record was replaced wholesale
    Replaced,
    /// Only the identity of an existing record changed
    IdentityUpdated,
    /// Only the position of an existing record changed
    PositionUpdated,
    /// Removal was requested (whether or not the record existed)
    Removed,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Created => write!(f, "created"),
            ChangeKind::Replaced => write!(f, "replaced"),
            ChangeKind::IdentityUpdated => write!(f, "identity_updated"),
            ChangeKind::PositionUpdated => write!(f, "position_updated"),
            ChangeKind::Removed => write!(f, "removed"),
        }
    }
}

/// "Node list changed" notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEvent {
    /// Node the mutation touched
    pub changed_number: NodeNum,
    pub change_kind: ChangeKind,
}

impl NodeEvent {
    pub fn new(changed_number: NodeNum, change_kind: ChangeKind) -> Self {
        Self {
            changed_number,
            change_kind,
        }
    }

    /// Whether the node may now be missing from the registry
    pub fn is_removal(&self) -> bool {
        matches!(self.change_kind, ChangeKind::Removed)
    }

    /// Whether the node's identity may have changed
    pub fn touches_identity(&self) -> bool {
        matches!(
            self.change_kind,
            ChangeKind::Created | ChangeKind::Replaced | ChangeKind::IdentityUpdated | ChangeKind::Removed
        )
    }

    /// Whether the node's position may have changed
    pub fn touches_position(&self) -> bool {
        matches!(
            self.change_kind,
            ChangeKind::Created | ChangeKind::Replaced | ChangeKind::PositionUpdated | ChangeKind::Removed
        )
    }
}
