impl<C: EditableChild> EditableCollection<C> {
    /// Inserts a child at `index`, making this collection its parent.
    ///
    /// Fails with [`GraphError::InvalidUsage`] when the element is not marked
    /// as a child or the index is past the end.
    pub fn insert(&mut self, index: usize, mut child: C) -> Result<()> {
        if !child.is_child() {
            return Err(GraphError::InvalidUsage(
                "element must be marked as a child before insertion".to_string(),
            ));
        }
        if index > self.items.len() {
            return Err(self.index_error("insert", index));
        }

        self.claim_identity(&mut child, None);
        child.set_parent(self.node.link());
        let identity = child.identity();
        self.items.insert(index, child);
        trace!(
            "collection '{}' inserted child {} at {}",
            self.name, identity, index
        );
        self.notify(CollectionChange::added(index, identity));
        Ok(())
    }

    /// Appends a child at the end of the active set.
    pub fn push(&mut self, child: C) -> Result<()> {
        self.insert(self.items.len(), child)
    }

    /// Removes the child at `index`.
    ///
    /// A persisted child is marked deleted and moved to the deleted store; a
    /// new child is discarded. Observers see one `Removed` notification.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        if index >= self.items.len() {
            return Err(self.index_error("remove", index));
        }
        self.remove_at(index);
        Ok(())
    }

    /// Replaces the child at `index`, routing the displaced child through the
    /// same delete-or-discard rule as [`remove`](Self::remove).
    ///
    /// A displaced child carrying the same identity as `child` is the same
    /// logical object and is dropped without being deleted. An incoming child
    /// whose identity belongs to any other child here is renumbered first.
    /// Observers see one `Changed` notification.
    pub fn replace(&mut self, index: usize, mut child: C) -> Result<()> {
        if !child.is_child() {
            return Err(GraphError::InvalidUsage(
                "element must be marked as a child before insertion".to_string(),
            ));
        }
        if index >= self.items.len() {
            return Err(self.index_error("replace", index));
        }

        self.claim_identity(&mut child, Some(index));
        child.set_parent(self.node.link());
        let identity = child.identity();
        let displaced = std::mem::replace(&mut self.items[index], child);
        if displaced.identity() != identity || identity == UNASSIGNED_IDENTITY {
            self.delete_child(displaced);
        }
        self.notify(CollectionChange::changed(index, identity, None));
        Ok(())
    }

    /// Removes every active child one at a time so each follows the
    /// delete-or-discard rule, then raises a single `Cleared` notification.
    pub fn clear(&mut self) {
        let count = self.items.len();
        self.with_change_events_suppressed(|collection| {
            while !collection.items.is_empty() {
                collection.remove_at(0);
            }
            collection.items.clear();
        });
        debug!(
            "collection '{}' cleared {} children ({} pending deletes)",
            self.name,
            count,
            self.deleted_count()
        );
        self.notify(CollectionChange::cleared());
    }

    /// Requests a fresh child from the portal, appends it and returns it.
    pub async fn add_new<P>(&mut self, portal: &P) -> Result<&mut C>
    where
        C: Send,
        P: ChildPortal<C> + ?Sized,
    {
        if !self.runtime.policy.allow_new {
            return Err(GraphError::InvalidUsage(format!(
                "collection '{}' does not allow new children",
                self.name
            )));
        }
        let child = portal.create_child().await?;
        self.push(child)?;
        let name = self.name.clone();
        self.items.last_mut().ok_or_else(|| {
            GraphError::InvalidUsage(format!("collection '{}' lost its new child", name))
        })
    }

    /// Moves a child out of the deleted store and back into the active set
    /// at `index`, restoring the state it had before deletion.
    pub fn undelete(&mut self, identity: Identity, index: usize) -> Result<()> {
        if index > self.items.len() {
            return Err(self.index_error("undelete", index));
        }
        let mut child = self
            .deleted
            .as_mut()
            .and_then(|store| store.take(identity))
            .ok_or_else(|| {
                GraphError::InvalidUsage(format!(
                    "child {} is not in the deleted store of collection '{}'",
                    identity, self.name
                ))
            })?;
        child.mark_undeleted();
        self.insert(index, child)
    }

    /// Removes the child with the given identity on its own behalf.
    pub fn remove_child(&mut self, identity: Identity) -> Result<()> {
        let index = self.position_of(identity).ok_or_else(|| {
            GraphError::InvalidUsage(format!(
                "child {} does not belong to collection '{}'",
                identity, self.name
            ))
        })?;
        self.remove_at(index);
        Ok(())
    }

    /// Applies `edit` to the child at `index` and reports the change.
    pub fn edit<R>(&mut self, index: usize, edit: impl FnOnce(&mut C) -> R) -> Result<R> {
        let Some(child) = self.items.get_mut(index) else {
            return Err(self.index_error("edit", index));
        };
        let result = edit(child);
        let identity = child.identity();
        self.notify(CollectionChange::changed(index, identity, None));
        Ok(result)
    }

    /// Reports that a property of the child with `identity` changed.
    pub fn notify_child_changed(&self, identity: Identity, property: &str) -> Result<()> {
        let index = self.position_of(identity).ok_or_else(|| {
            GraphError::InvalidUsage(format!(
                "child {} does not belong to collection '{}'",
                identity, self.name
            ))
        })?;
        self.notify(CollectionChange::changed(
            index,
            identity,
            Some(property.to_string()),
        ));
        Ok(())
    }

    /// Drops the identity `child` brought along when another active or
    /// deleted child already holds it; `replacing` is the slot being
    /// overwritten, whose holder does not count.
    fn claim_identity(&self, child: &mut C, replacing: Option<usize>) {
        let identity = child.identity();
        if identity == UNASSIGNED_IDENTITY {
            return;
        }
        let taken = self
            .items
            .iter()
            .enumerate()
            .any(|(index, held)| Some(index) != replacing && held.identity() == identity)
            || self.contains_deleted(identity);
        if taken {
            debug!(
                "collection '{}' renumbers incoming child {}: identity already taken",
                self.name, identity
            );
            child.mark_as_child();
        }
    }

    fn remove_at(&mut self, index: usize) {
        let child = self.items.remove(index);
        let identity = child.identity();
        self.delete_child(child);
        self.notify(CollectionChange::removed(index, identity));
    }

    fn delete_child(&mut self, mut child: C) {
        if child.is_new() {
            trace!(
                "collection '{}' discarded new child {}",
                self.name,
                child.identity()
            );
            return;
        }
        child.mark_deleted();
        trace!(
            "collection '{}' moved child {} to deleted store",
            self.name,
            child.identity()
        );
        self.deleted_store_mut().push(child);
    }

    fn index_error(&self, operation: &str, index: usize) -> GraphError {
        warn!(
            "collection '{}' rejected {} at index {} (len {})",
            self.name,
            operation,
            index,
            self.items.len()
        );
        GraphError::InvalidUsage(format!(
            "{} index {} is out of range for collection '{}' with {} items",
            operation,
            index,
            self.name,
            self.items.len()
        ))
    }
}

impl<C: EditableChild> ParentAggregate for EditableCollection<C> {
    fn parent(&self) -> ParentLink {
        EditableCollection::parent(self)
    }

    fn remove_child(&mut self, identity: Identity) -> Result<()> {
        EditableCollection::remove_child(self, identity)
    }

    fn next_identity(&self, current: Identity) -> Identity {
        EditableCollection::next_identity(self, current)
    }
}
