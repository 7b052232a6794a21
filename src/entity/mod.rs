//! Child entity contract.
//!
//! [`TrackStatus`] is the read side every graph object exposes; collections
//! implement it too. [`EditableChild`] adds the parent wiring and lifecycle
//! hooks an [`EditableCollection`](crate::collection::EditableCollection)
//! drives when it inserts, removes and persists elements.

use crate::core::{Identity, UNASSIGNED_IDENTITY};
use crate::graph::{GraphNode, ParentLink};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Status flags reported by every object in an editable graph.
pub trait TrackStatus {
    /// Object has never been persisted.
    fn is_new(&self) -> bool;
    /// Object is marked for deletion.
    fn is_deleted(&self) -> bool;
    /// Object's own data changed, ignoring nested children.
    fn is_self_dirty(&self) -> bool;
    /// Object or any nested child changed.
    fn is_dirty(&self) -> bool {
        self.is_self_dirty()
    }
    fn is_self_valid(&self) -> bool;
    fn is_valid(&self) -> bool {
        self.is_self_valid()
    }
    /// An asynchronous operation on the object itself is outstanding.
    fn is_self_busy(&self) -> bool;
    fn is_busy(&self) -> bool {
        self.is_self_busy()
    }
    fn is_child(&self) -> bool;
}

/// Capabilities an element must provide to live inside an editable collection.
pub trait EditableChild: TrackStatus {
    fn identity(&self) -> Identity;

    fn parent(&self) -> ParentLink;

    /// Called by the owning collection on insert and after deserialization.
    fn set_parent(&mut self, parent: ParentLink);

    /// Flags the object as owned by an aggregate. Implementations drop any
    /// identity carried over from another graph, so the next
    /// [`set_parent`](Self::set_parent) assigns a fresh one.
    ///
    /// Called by the owning collection when an incoming child's identity is
    /// already taken there.
    fn mark_as_child(&mut self);

    /// Called when the owning collection moves the object to its deleted store.
    fn mark_deleted(&mut self);

    /// Reverses [`mark_deleted`](Self::mark_deleted) when an object is undeleted.
    fn mark_undeleted(&mut self);

    fn mark_new(&mut self);

    fn mark_old(&mut self);

    /// Human readable descriptions of the object's broken validation rules.
    fn broken_rules(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Reusable lifecycle state for child entities.
///
/// Entities embed one `ChildState` and delegate the contract to it, usually
/// through [`impl_editable_child!`](crate::impl_editable_child). The parent
/// link, the graph node and the busy flag are transient and never serialized.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChildState {
    identity: Identity,
    is_new: bool,
    is_deleted: bool,
    is_dirty: bool,
    is_child: bool,
    #[serde(default)]
    broken_rules: Vec<String>,
    #[serde(default)]
    dirty_before_delete: bool,
    #[serde(skip)]
    is_busy: bool,
    #[serde(skip)]
    parent: ParentLink,
    #[serde(skip, default = "GraphNode::new")]
    node: Arc<GraphNode>,
}

impl Clone for ChildState {
    // A copy anchors its own nested children, so it never shares the node.
    fn clone(&self) -> Self {
        Self {
            identity: self.identity,
            is_new: self.is_new,
            is_deleted: self.is_deleted,
            is_dirty: self.is_dirty,
            is_child: self.is_child,
            broken_rules: self.broken_rules.clone(),
            dirty_before_delete: self.dirty_before_delete,
            is_busy: self.is_busy,
            parent: self.parent.clone(),
            node: GraphNode::new(),
        }
    }
}

impl Default for ChildState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChildState {
    /// State of a freshly created object: new, dirty, not yet a child.
    pub fn new() -> Self {
        Self {
            identity: UNASSIGNED_IDENTITY,
            is_new: true,
            is_deleted: false,
            is_dirty: true,
            is_child: false,
            broken_rules: Vec::new(),
            dirty_before_delete: false,
            is_busy: false,
            parent: ParentLink::none(),
            node: GraphNode::new(),
        }
    }

    /// State of a freshly created child object.
    pub fn new_child() -> Self {
        let mut state = Self::new();
        state.mark_as_child();
        state
    }

    /// State of a child loaded from the store: old and clean.
    pub fn fetched_child() -> Self {
        let mut state = Self::new_child();
        state.mark_old();
        state
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_valid(&self) -> bool {
        self.broken_rules.is_empty()
    }

    pub fn is_busy(&self) -> bool {
        self.is_busy
    }

    pub fn is_child(&self) -> bool {
        self.is_child
    }

    pub fn broken_rules(&self) -> &[String] {
        &self.broken_rules
    }

    pub fn parent(&self) -> ParentLink {
        self.parent.clone()
    }

    /// Link nested children of the owning entity attach to.
    pub fn link(&self) -> ParentLink {
        self.node.link()
    }

    /// Stores the parent link and takes the next identity from its root.
    pub fn set_parent(&mut self, parent: ParentLink) {
        self.node.attach(parent.clone());
        if let Some(identity) = parent.next_identity(self.identity) {
            self.identity = identity;
        }
        self.parent = parent;
    }

    /// Marks the object as a child and drops its identity; the next
    /// [`set_parent`](Self::set_parent) numbers it within the new graph.
    pub fn mark_as_child(&mut self) {
        self.is_child = true;
        self.identity = UNASSIGNED_IDENTITY;
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    pub fn mark_new(&mut self) {
        self.is_new = true;
        self.is_deleted = false;
        self.is_dirty = true;
    }

    pub fn mark_old(&mut self) {
        self.is_new = false;
        self.is_dirty = false;
    }

    pub fn mark_deleted(&mut self) {
        if !self.is_deleted {
            self.dirty_before_delete = self.is_dirty;
        }
        self.is_deleted = true;
        self.is_dirty = true;
    }

    pub fn mark_undeleted(&mut self) {
        if self.is_deleted {
            self.is_deleted = false;
            self.is_dirty = self.dirty_before_delete;
            self.dirty_before_delete = false;
        }
    }

    pub fn mark_busy(&mut self) {
        self.is_busy = true;
    }

    pub fn mark_idle(&mut self) {
        self.is_busy = false;
    }

    pub fn add_broken_rule(&mut self, rule: impl Into<String>) {
        self.broken_rules.push(rule.into());
    }

    pub fn set_broken_rules(&mut self, rules: Vec<String>) {
        self.broken_rules = rules;
    }

    pub fn clear_broken_rules(&mut self) {
        self.broken_rules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_then_undelete_restores_clean_state() {
        let mut state = ChildState::fetched_child();
        assert!(!state.is_dirty());

        state.mark_deleted();
        assert!(state.is_deleted());
        assert!(state.is_dirty());

        state.mark_undeleted();
        assert!(!state.is_deleted());
        assert!(!state.is_dirty());
    }

    #[test]
    fn repeated_delete_keeps_original_dirty_flag() {
        let mut state = ChildState::fetched_child();
        state.mark_deleted();
        state.mark_deleted();
        state.mark_undeleted();
        assert!(!state.is_dirty());
    }

    #[test]
    fn marking_as_child_drops_a_carried_identity() {
        let parent = GraphNode::new();
        let mut state = ChildState::fetched_child();
        state.set_parent(parent.link());
        assert_eq!(state.identity(), 1);

        state.mark_as_child();
        assert_eq!(state.identity(), UNASSIGNED_IDENTITY);

        state.set_parent(parent.link());
        assert_eq!(state.identity(), 2);
    }

    #[test]
    fn transient_fields_are_not_serialized() {
        let mut state = ChildState::fetched_child();
        state.mark_busy();
        state.add_broken_rule("name is required");

        let json = serde_json::to_value(&state).expect("serialize state");
        assert!(json.get("parent").is_none());
        assert!(json.get("is_busy").is_none());

        let restored: ChildState = serde_json::from_value(json).expect("deserialize state");
        assert!(!restored.is_busy());
        assert!(!restored.is_valid());
        assert!(!restored.is_new());
        assert!(!restored.parent().is_attached());
    }
}
