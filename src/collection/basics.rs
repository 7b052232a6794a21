impl<C> EditableCollection<C> {
    /// Creates an empty root collection with the default policy.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_policy(name, CollectionPolicy::default())
    }

    /// Creates an empty collection already marked as a child.
    pub fn new_child(name: impl Into<String>) -> Self {
        let mut collection = Self::new(name);
        collection.mark_as_child();
        collection
    }

    /// Creates an empty root collection governed by `policy`.
    pub fn with_policy(name: impl Into<String>, policy: CollectionPolicy) -> Self {
        let node = GraphNode::new();
        let identity = node.next_identity(UNASSIGNED_IDENTITY);
        Self {
            name: name.into(),
            items: Vec::new(),
            deleted: None,
            is_child: false,
            identity,
            node,
            raise_change_events: policy.raise_change_events,
            runtime: CollectionRuntime::new(policy),
        }
    }

    /// Returns the logical name of the collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Active items in order.
    pub fn items(&self) -> &[C] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Option<&C> {
        self.items.get(index)
    }

    /// Mutable access without a change notification; see [`edit`](Self::edit).
    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.items.get_mut(index)
    }

    /// Children removed from the active set and awaiting a persisted delete.
    pub fn deleted_items(&self) -> &[C] {
        self.deleted
            .as_ref()
            .map(DeletedStore::items)
            .unwrap_or_default()
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.as_ref().map_or(0, DeletedStore::len)
    }

    /// Indicates whether this collection is a child of another aggregate.
    pub fn is_child(&self) -> bool {
        self.is_child
    }

    /// Marks the collection as a child; child collections are saved by their
    /// parent, never directly.
    pub fn mark_as_child(&mut self) {
        self.is_child = true;
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Link children of this collection hold to reach it.
    pub fn link(&self) -> ParentLink {
        self.node.link()
    }

    pub fn node_id(&self) -> uuid::Uuid {
        self.node.id()
    }

    /// Link to the containing aggregate; `none` for a root collection.
    pub fn parent(&self) -> ParentLink {
        self.node.parent()
    }

    /// Next identity from the nearest root of the graph.
    pub fn next_identity(&self, current: Identity) -> Identity {
        self.node.next_identity(current)
    }

    /// Attaches this collection to a containing aggregate.
    ///
    /// The collection drops any identity counter it owned as a root and
    /// resolves its identity through the new ancestor chain.
    pub fn set_parent(&mut self, parent: ParentLink) {
        self.node.attach(parent);
        self.identity = self.node.next_identity(self.identity);
    }

    pub fn policy(&self) -> &CollectionPolicy {
        &self.runtime.policy
    }

    pub fn set_policy(&mut self, policy: CollectionPolicy) {
        self.runtime.policy = policy;
    }

    pub fn set_authorizer(&mut self, authorizer: Arc<dyn Authorizer>) {
        self.runtime.authorizer = authorizer;
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.set_authorizer(authorizer);
        self
    }

    /// Checks `action` against the configured authorizer, using the
    /// collection name as the target.
    pub fn has_permission(&self, action: AuthorizationAction) -> bool {
        self.runtime.authorizer.has_permission(action, &self.name)
    }

    /// Registers an observer for change notifications.
    pub fn subscribe(&mut self, observer: Arc<dyn ChangeObserver>) {
        self.runtime.change_observers.push(observer);
    }

    /// Registers a closure for change notifications.
    pub fn on_change<F>(&mut self, observer: F)
    where
        F: Fn(&CollectionChange) + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(observer));
    }

    pub fn clear_observers(&mut self) {
        self.runtime.change_observers.clear();
        self.runtime.saved_observers.clear();
    }

    pub fn raise_change_events(&self) -> bool {
        self.raise_change_events
    }

    /// Turns notifications on or off, returning the previous state.
    pub fn set_raise_change_events(&mut self, raise: bool) -> bool {
        std::mem::replace(&mut self.raise_change_events, raise)
    }

    /// Turns notifications off until the returned guard is dropped, which
    /// restores the previous state on every exit path, unwinding included.
    pub fn suppress_change_events(&mut self) -> SuppressedChangeEvents<'_, C> {
        let previous = self.set_raise_change_events(false);
        SuppressedChangeEvents {
            collection: self,
            previous,
        }
    }

    /// Runs `f` with notifications suppressed, restoring the previous state
    /// afterwards whatever `f` returns.
    pub fn with_change_events_suppressed<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let mut suppressed = self.suppress_change_events();
        f(&mut *suppressed)
    }

    /// Tells observers to refresh their whole view.
    pub fn reset_bindings(&self) {
        self.notify(CollectionChange::cleared());
    }

    pub(crate) fn notify(&self, change: CollectionChange) {
        if !self.raise_change_events {
            trace!(
                "collection '{}' suppressed {:?} notification",
                self.name, change.action
            );
            return;
        }
        for observer in &self.runtime.change_observers {
            observer.on_change(&change);
        }
    }

    fn deleted_store_mut(&mut self) -> &mut DeletedStore<C> {
        self.deleted.get_or_insert_with(DeletedStore::new)
    }
}

impl<C: EditableChild> EditableCollection<C> {
    pub fn position_of(&self, identity: Identity) -> Option<usize> {
        self.items
            .iter()
            .position(|child| child.identity() == identity)
    }

    pub fn find(&self, identity: Identity) -> Option<&C> {
        self.items.iter().find(|child| child.identity() == identity)
    }

    pub fn contains(&self, identity: Identity) -> bool {
        self.position_of(identity).is_some()
    }

    /// Returns `true` if the deleted store holds the child with this identity.
    pub fn contains_deleted(&self, identity: Identity) -> bool {
        self.deleted
            .as_ref()
            .is_some_and(|store| store.contains(identity))
    }

    /// Returns `true` when `child` holds a parent link to this collection.
    pub fn is_parent_of(&self, child: &C) -> bool {
        child.parent().points_to(&self.node)
    }

    /// Checks that every active and deleted child points back at this
    /// collection.
    pub fn verify_parent_links(&self) -> Result<()> {
        let stray = self
            .items
            .iter()
            .chain(self.deleted_items())
            .find(|child| !self.is_parent_of(child));
        match stray {
            Some(child) => Err(GraphError::InvalidUsage(format!(
                "Child {} of collection '{}' is not linked to it as parent",
                child.identity(),
                self.name
            ))),
            None => Ok(()),
        }
    }

    /// Rebuilds every child's parent link; used after deserialization.
    pub(crate) fn reconnect_children(&mut self) {
        let link = self.node.link();
        for child in &mut self.items {
            child.set_parent(link.clone());
        }
        if let Some(store) = self.deleted.as_mut() {
            for child in store.iter_mut() {
                child.set_parent(link.clone());
            }
        }
    }
}

impl<C: Clone> EditableCollection<C> {
    /// Copies the active items into a vector.
    pub fn to_vec(&self) -> Vec<C> {
        self.items.clone()
    }
}

/// The copy is detached: it anchors its own graph and has no observers until
/// an owner calls [`set_parent`](EditableCollection::set_parent) on it.
impl<C: EditableChild + Clone> Clone for EditableCollection<C> {
    fn clone(&self) -> Self {
        let node = GraphNode::new();
        let identity = node.next_identity(self.identity);
        let mut copy = Self {
            name: self.name.clone(),
            items: self.items.clone(),
            deleted: self.deleted.clone(),
            is_child: self.is_child,
            identity,
            node,
            raise_change_events: self.raise_change_events,
            runtime: self.runtime.detached(),
        };
        copy.reconnect_children();
        copy
    }
}

/// Scope in which a collection raises no change notifications.
///
/// Dereferences to the collection; dropping it restores the notification
/// state captured by [`EditableCollection::suppress_change_events`].
pub struct SuppressedChangeEvents<'a, C> {
    collection: &'a mut EditableCollection<C>,
    previous: bool,
}

impl<C> std::ops::Deref for SuppressedChangeEvents<'_, C> {
    type Target = EditableCollection<C>;

    fn deref(&self) -> &Self::Target {
        self.collection
    }
}

impl<C> std::ops::DerefMut for SuppressedChangeEvents<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.collection
    }
}

impl<C> Drop for SuppressedChangeEvents<'_, C> {
    fn drop(&mut self) {
        self.collection.raise_change_events = self.previous;
    }
}

impl<'a, C> IntoIterator for &'a EditableCollection<C> {
    type Item = &'a C;
    type IntoIter = std::slice::Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<C: fmt::Debug> fmt::Debug for EditableCollection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditableCollection")
            .field("name", &self.name)
            .field("identity", &self.identity)
            .field("is_child", &self.is_child)
            .field("items", &self.items)
            .field("deleted", &self.deleted)
            .finish_non_exhaustive()
    }
}
