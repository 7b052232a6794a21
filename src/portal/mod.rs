//! Persistence boundary consumed by editable collections.
//!
//! The collection never talks to a store directly. It asks a [`ChildPortal`]
//! for fresh children and to persist individual children, and hands whole
//! root aggregates to a [`RootPortal`], whose update handling walks the graph
//! through [`EditableCollection::update_children`].
//!
//! [`EditableCollection::update_children`]: crate::collection::EditableCollection::update_children

use crate::core::Result;
use async_trait::async_trait;

pub mod auth;
pub mod in_memory;

pub use auth::{AllowAll, Authorizer, PermissionTable};
pub use in_memory::{InMemoryDataPortal, PortalOperation, PortalOperationKind, PortalRecord};

/// Child-level operations of the data portal.
#[async_trait]
pub trait ChildPortal<C: Send>: Send + Sync {
    /// Creates a brand-new child instance, already marked as a child.
    async fn create_child(&self) -> Result<C>;

    /// Persists one child. Insert, update or delete is inferred from the
    /// child's own new/deleted flags.
    async fn update_child(&self, child: &mut C, params: &[serde_json::Value]) -> Result<()>;
}

/// Root-level update of the data portal.
#[async_trait]
pub trait RootPortal<T: Send>: Send + Sync {
    /// Persists a root aggregate and returns the authoritative post-save instance.
    async fn update_root(&self, root: T) -> Result<T>;
}
