//! Parent/child wiring for editable object graphs.
//!
//! Every aggregate that can own children (a collection, or an entity holding
//! nested collections) owns one [`GraphNode`] behind an `Arc`. Children keep a
//! [`ParentLink`], which is a `Weak` handle to that node, so ownership stays
//! strictly parent → children and moving the owning struct never invalidates
//! the back-reference.
//!
//! The root node of a graph lazily owns the [`IdentityManager`] that hands out
//! identities for every object attached beneath it.

use crate::core::{Identity, Result, UNASSIGNED_IDENTITY};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use uuid::Uuid;

/// Sequence counter owned by the root of an object graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityManager {
    last: Identity,
}

impl IdentityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the identity for an object currently holding `current`.
    ///
    /// Unassigned objects receive a fresh number; assigned ones keep theirs
    /// and the counter moves past it so later numbers never collide.
    pub fn next_identity(&mut self, current: Identity) -> Identity {
        if current > UNASSIGNED_IDENTITY {
            self.last = self.last.max(current);
            return current;
        }
        self.last += 1;
        self.last
    }

    pub fn last_identity(&self) -> Identity {
        self.last
    }
}

#[derive(Default)]
struct NodeLinks {
    parent: ParentLink,
    identities: Option<IdentityManager>,
}

/// Identity-bearing anchor of an aggregate inside an object graph.
pub struct GraphNode {
    id: Uuid,
    links: Mutex<NodeLinks>,
}

impl GraphNode {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            links: Mutex::new(NodeLinks::default()),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Creates a non-owning handle children use to reach this node.
    pub fn link(self: &Arc<Self>) -> ParentLink {
        ParentLink(Some(Arc::downgrade(self)))
    }

    pub fn parent(&self) -> ParentLink {
        self.lock().parent.clone()
    }

    /// Re-parents the node. The local identity counter is discarded so the
    /// next request is served by the new ancestor chain.
    pub fn attach(&self, parent: ParentLink) {
        let mut links = self.lock();
        links.parent = parent;
        links.identities = None;
    }

    pub fn is_root(&self) -> bool {
        self.parent().upgrade().is_none()
    }

    /// Asks the nearest root for the next identity, materializing the root
    /// counter on first use.
    pub fn next_identity(&self, current: Identity) -> Identity {
        let parent = self.parent().upgrade();
        match parent {
            Some(parent) => parent.next_identity(current),
            None => self
                .lock()
                .identities
                .get_or_insert_with(IdentityManager::new)
                .next_identity(current),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NodeLinks> {
        // The guarded data is two plain values; a poisoned lock leaves them usable.
        self.links.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNode")
            .field("id", &self.id)
            .field("is_root", &self.is_root())
            .finish()
    }
}

/// Non-owning back-reference from a child to its owning aggregate.
#[derive(Clone, Default)]
pub struct ParentLink(Option<Weak<GraphNode>>);

impl ParentLink {
    /// A link that points nowhere; the state of every root object.
    pub fn none() -> Self {
        Self(None)
    }

    pub fn upgrade(&self) -> Option<Arc<GraphNode>> {
        self.0.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_attached(&self) -> bool {
        self.upgrade().is_some()
    }

    pub fn node_id(&self) -> Option<Uuid> {
        self.upgrade().map(|node| node.id())
    }

    pub fn points_to(&self, node: &Arc<GraphNode>) -> bool {
        self.0
            .as_ref()
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(node)))
    }

    /// Resolves the next identity through the parent chain, or `None` when
    /// the link is dangling.
    pub fn next_identity(&self, current: Identity) -> Option<Identity> {
        self.upgrade().map(|node| node.next_identity(current))
    }
}

impl fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node_id() {
            Some(id) => write!(f, "ParentLink({id})"),
            None => f.write_str("ParentLink(none)"),
        }
    }
}

/// Capabilities an aggregate exposes to the children it owns.
pub trait ParentAggregate {
    /// Link to this aggregate's own parent; `none` for roots.
    fn parent(&self) -> ParentLink;

    /// Detaches the child with the given identity on its behalf.
    fn remove_child(&mut self, identity: Identity) -> Result<()>;

    /// Next identity from the nearest root of the graph.
    fn next_identity(&self, current: Identity) -> Identity;
}
