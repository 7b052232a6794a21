//! Recommended imports grouped by role.
//!
//! `model` is what business-object code needs to declare children and work
//! with collections. `persistence` adds the portal boundary for code that
//! implements or drives saves.

pub mod model {
    //! Entity and collection surface.
    pub use crate::impl_editable_child;
    pub use crate::{
        ChangeAction, ChildState, CollectionChange, CollectionPolicy, EditableChild,
        EditableCollection, GraphError, Identity, Result, TrackStatus,
    };
}

pub mod persistence {
    //! Data portal boundary and the in-memory implementation.
    pub use crate::portal::{
        AllowAll, Authorizer, ChildPortal, InMemoryDataPortal, PermissionTable, PortalOperation,
        PortalOperationKind, PortalRecord, RootPortal,
    };
    pub use crate::save::SavedEvent;
}

pub use model::*;
pub use persistence::*;
