// ============================================================================
// editgraph
// ============================================================================
//
// Editable child collections for business-object graphs: ordered children,
// soft deletes held until the next save, parent back-links, dirty/valid/busy
// roll-up and a two-phase save through a pluggable data portal.

pub mod collection;
pub mod config;
pub mod core;
pub mod deleted_store;
pub mod entity;
pub mod graph;
mod macros;
pub mod portal;
pub mod prelude;
pub mod save;

// Re-export main types for convenience
pub use collection::{
    COLLECTION_WIRE_FORMAT_VERSION, ChangeObserver, EditableCollection, SuppressedChangeEvents,
};
pub use config::CollectionPolicy;
pub use crate::core::{
    AuthorizationAction, ChangeAction, CollectionChange, GraphError, Identity, Result,
    UNASSIGNED_IDENTITY,
};
pub use deleted_store::DeletedStore;
pub use entity::{ChildState, EditableChild, TrackStatus};
pub use graph::{GraphNode, IdentityManager, ParentAggregate, ParentLink};
pub use portal::{
    AllowAll, Authorizer, ChildPortal, InMemoryDataPortal, PermissionTable, PortalOperation,
    PortalOperationKind, PortalRecord, RootPortal,
};
pub use save::{SavedEvent, SavedObserver};
