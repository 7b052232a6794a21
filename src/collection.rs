use crate::config::CollectionPolicy;
use crate::core::{
    AuthorizationAction, CollectionChange, GraphError, Identity, Result, UNASSIGNED_IDENTITY,
};
use crate::deleted_store::DeletedStore;
use crate::entity::{EditableChild, TrackStatus};
use crate::graph::{GraphNode, ParentAggregate, ParentLink};
use crate::portal::{AllowAll, Authorizer, ChildPortal};
use crate::save::SavedObserver;
use log::{debug, trace, warn};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Version of the serialized collection layout.
pub const COLLECTION_WIRE_FORMAT_VERSION: u32 = 1;

/// Receiver of structural and item-level change notifications.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, change: &CollectionChange);
}

impl<F> ChangeObserver for F
where
    F: Fn(&CollectionChange) + Send + Sync,
{
    fn on_change(&self, change: &CollectionChange) {
        self(change)
    }
}

/// Transient state of a collection: never serialized, carried across save
/// adoption.
pub(crate) struct CollectionRuntime<C> {
    pub(crate) policy: CollectionPolicy,
    pub(crate) authorizer: Arc<dyn Authorizer>,
    pub(crate) change_observers: Vec<Arc<dyn ChangeObserver>>,
    pub(crate) saved_observers: Vec<SavedObserver<C>>,
}

impl<C> CollectionRuntime<C> {
    fn new(policy: CollectionPolicy) -> Self {
        Self {
            policy,
            authorizer: Arc::new(AllowAll),
            change_observers: Vec::new(),
            saved_observers: Vec::new(),
        }
    }

    /// Policy and authorizer only; observers stay with the original.
    fn detached(&self) -> Self {
        Self {
            policy: self.policy.clone(),
            authorizer: Arc::clone(&self.authorizer),
            change_observers: Vec::new(),
            saved_observers: Vec::new(),
        }
    }
}

impl<C> Clone for CollectionRuntime<C> {
    fn clone(&self) -> Self {
        Self {
            policy: self.policy.clone(),
            authorizer: Arc::clone(&self.authorizer),
            change_observers: self.change_observers.clone(),
            saved_observers: self.saved_observers.clone(),
        }
    }
}

/// Ordered, observable collection of editable children.
///
/// Removing a persisted child moves it into the collection's deleted store
/// instead of dropping it, so a later save can delete it from the store.
/// Children that were never persisted are discarded on removal.
///
/// The collection owns one [`GraphNode`]; every child holds a [`ParentLink`]
/// to it. Serialization writes the active items, the deleted store and the
/// child flag, and deserialization rebuilds every parent link.
pub struct EditableCollection<C> {
    pub(crate) name: String,
    pub(crate) items: Vec<C>,
    pub(crate) deleted: Option<DeletedStore<C>>,
    pub(crate) is_child: bool,
    pub(crate) identity: Identity,
    pub(crate) node: Arc<GraphNode>,
    pub(crate) raise_change_events: bool,
    pub(crate) runtime: CollectionRuntime<C>,
}

// Split by concern; every part shares this module's imports and visibility.
include!("collection/basics.rs");
include!("collection/mutations.rs");
include!("collection/status.rs");
include!("collection/wire.rs");
