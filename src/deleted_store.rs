use crate::core::Identity;
use crate::entity::EditableChild;
use serde::{Deserialize, Serialize};

/// Ordered holding area for children removed from the active set whose
/// deletion has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeletedStore<C> {
    items: Vec<C>,
}

impl<C> Default for DeletedStore<C> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<C> DeletedStore<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[C] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, C> {
        self.items.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, C> {
        self.items.iter_mut()
    }

    pub(crate) fn push(&mut self, child: C) {
        self.items.push(child);
    }

    /// Drops every pending deletion; called once the deletes are persisted.
    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}

impl<C: EditableChild> DeletedStore<C> {
    pub fn contains(&self, identity: Identity) -> bool {
        self.position(identity).is_some()
    }

    pub fn find(&self, identity: Identity) -> Option<&C> {
        self.items.iter().find(|child| child.identity() == identity)
    }

    pub(crate) fn take(&mut self, identity: Identity) -> Option<C> {
        let position = self.position(identity)?;
        Some(self.items.remove(position))
    }

    fn position(&self, identity: Identity) -> Option<usize> {
        self.items
            .iter()
            .position(|child| child.identity() == identity)
    }
}

impl<'a, C> IntoIterator for &'a DeletedStore<C> {
    type Item = &'a C;
    type IntoIter = std::slice::Iter<'a, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
