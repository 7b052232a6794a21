use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-root sequence number distinguishing otherwise identical child instances.
pub type Identity = i32;

/// Identity value carried by objects that were never attached to a graph.
pub const UNASSIGNED_IDENTITY: Identity = -1;

/// Action checked against the authorizer before an object operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizationAction {
    CreateObject,
    GetObject,
    EditObject,
    DeleteObject,
}

impl fmt::Display for AuthorizationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateObject => "create",
            Self::GetObject => "get",
            Self::EditObject => "edit",
            Self::DeleteObject => "delete",
        };
        f.write_str(name)
    }
}

/// Kind of change reported to collection observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeAction {
    Added,
    Removed,
    Changed,
    /// The whole view must be refreshed.
    Cleared,
}

/// Explicit descriptor of a single change in an observable collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionChange {
    pub action: ChangeAction,
    /// Position of the affected item; `None` for whole-collection changes.
    pub index: Option<usize>,
    pub identity: Identity,
    /// Name of the child property that changed, when known.
    pub property: Option<String>,
}

impl CollectionChange {
    pub fn added(index: usize, identity: Identity) -> Self {
        Self {
            action: ChangeAction::Added,
            index: Some(index),
            identity,
            property: None,
        }
    }

    pub fn removed(index: usize, identity: Identity) -> Self {
        Self {
            action: ChangeAction::Removed,
            index: Some(index),
            identity,
            property: None,
        }
    }

    pub fn changed(index: usize, identity: Identity, property: Option<String>) -> Self {
        Self {
            action: ChangeAction::Changed,
            index: Some(index),
            identity,
            property,
        }
    }

    pub fn cleared() -> Self {
        Self {
            action: ChangeAction::Cleared,
            index: None,
            identity: UNASSIGNED_IDENTITY,
            property: None,
        }
    }
}
