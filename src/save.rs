//! Save orchestration for root collections.
//!
//! A save runs in two layers. [`EditableCollection::save`] checks the
//! preconditions, short-circuits clean graphs and hands a deep clone of the
//! collection to the [`RootPortal`]. The portal's update handling then calls
//! [`EditableCollection::update_children`], which flushes every pending
//! deletion before persisting any dirty active child.
//!
//! On success the refreshed instance returned by the portal replaces the
//! caller's collection in place; observers and policy move over to it. On
//! failure the caller's collection is left exactly as it was, because the
//! portal only ever worked on the clone.

use crate::collection::EditableCollection;
use crate::core::{GraphError, Result};
use crate::entity::{EditableChild, TrackStatus};
use crate::portal::{ChildPortal, RootPortal};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{Instrument, Level, event, info_span};

/// Outcome of a save attempt, delivered to `Saved` observers.
pub struct SavedEvent<'a, C> {
    /// Authoritative instance after the save; `None` when the save failed.
    pub new_instance: Option<&'a EditableCollection<C>>,
    pub error: Option<&'a GraphError>,
    pub user_state: Option<&'a serde_json::Value>,
    pub saved_at: DateTime<Utc>,
}

impl<C> SavedEvent<'_, C> {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Callback invoked after every save attempt.
pub type SavedObserver<C> = Arc<dyn Fn(&SavedEvent<'_, C>) + Send + Sync>;

impl<C> EditableCollection<C> {
    /// Registers a callback raised after every save attempt.
    pub fn on_saved<F>(&mut self, observer: F)
    where
        F: Fn(&SavedEvent<'_, C>) + Send + Sync + 'static,
    {
        self.runtime.saved_observers.push(Arc::new(observer));
    }

    fn raise_saved(&self, outcome: std::result::Result<(), &GraphError>, user_state: Option<&serde_json::Value>) {
        let event = SavedEvent {
            new_instance: outcome.is_ok().then_some(self),
            error: outcome.err(),
            user_state,
            saved_at: Utc::now(),
        };
        for observer in &self.runtime.saved_observers {
            observer(&event);
        }
    }
}

impl<C: EditableChild> EditableCollection<C> {
    /// Fails unless the collection may be handed to the portal: it must be
    /// a root, valid, and idle, in that order.
    pub fn ensure_can_save(&self) -> Result<()> {
        if self.is_child {
            return Err(GraphError::ChildSaveNotAllowed(self.name.clone()));
        }
        if !self.is_valid() {
            return Err(GraphError::Validation {
                collection: self.name.clone(),
                broken_rules: self.broken_rules(),
            });
        }
        if self.is_busy() {
            return Err(GraphError::BusyObject(self.name.clone()));
        }
        Ok(())
    }

    /// Persists every pending deletion, then every dirty active child.
    ///
    /// Called from a root portal's update handling, or from a parent entity
    /// persisting a nested collection. Notifications stay suppressed for the
    /// whole pass and come back even when the future is dropped midway. The
    /// deleted store is cleared once all deletes succeeded; a failure aborts
    /// the pass and leaves whatever was not yet flushed in place.
    pub async fn update_children<P>(
        &mut self,
        portal: &P,
        params: &[serde_json::Value],
    ) -> Result<()>
    where
        C: Send,
        P: ChildPortal<C> + ?Sized,
    {
        let mut suppressed = self.suppress_change_events();
        suppressed.flush_children(portal, params).await
    }

    async fn flush_children<P>(&mut self, portal: &P, params: &[serde_json::Value]) -> Result<()>
    where
        C: Send,
        P: ChildPortal<C> + ?Sized,
    {
        if let Some(store) = self.deleted.as_mut() {
            for child in store.iter_mut() {
                portal.update_child(child, params).await?;
            }
            event!(
                Level::DEBUG,
                collection = %self.name,
                deleted = store.len(),
                "collection deletions flushed"
            );
            store.clear();
        }

        let mut updated = 0usize;
        for child in self.items.iter_mut() {
            if child.is_dirty() {
                portal.update_child(child, params).await?;
                updated += 1;
            }
        }
        event!(
            Level::DEBUG,
            collection = %self.name,
            updated,
            "collection updates flushed"
        );
        Ok(())
    }
}

impl<C> EditableCollection<C>
where
    C: EditableChild + Serialize + DeserializeOwned + Send + Sync,
{
    /// Saves the collection through `portal`.
    ///
    /// A clean collection is left untouched. Otherwise the portal persists a
    /// deep clone and the instance it returns becomes `self`.
    pub async fn save<P>(&mut self, portal: &P) -> Result<()>
    where
        P: RootPortal<Self> + ?Sized,
    {
        self.save_with_state(portal, None).await
    }

    /// Like [`save`](Self::save), passing `user_state` through to `Saved`
    /// observers.
    pub async fn save_with_state<P>(
        &mut self,
        portal: &P,
        user_state: Option<serde_json::Value>,
    ) -> Result<()>
    where
        P: RootPortal<Self> + ?Sized,
    {
        let span = info_span!(
            "collection.save",
            collection = %self.name,
            identity = self.identity
        );
        let outcome = self.persist(portal).instrument(span.clone()).await;
        let _enter = span.enter();

        match outcome {
            Ok(None) => {
                event!(Level::DEBUG, "collection clean, save skipped");
                self.raise_saved(Ok(()), user_state.as_ref());
                Ok(())
            }
            Ok(Some(mut saved)) => {
                saved.runtime = self.runtime.clone();
                saved.raise_change_events = self.raise_change_events;
                *self = saved;
                event!(
                    Level::INFO,
                    items = self.items.len(),
                    "collection saved"
                );
                self.raise_saved(Ok(()), user_state.as_ref());
                Ok(())
            }
            Err(err) => {
                event!(Level::ERROR, error = %err, "collection save failed");
                self.raise_saved(Err(&err), user_state.as_ref());
                Err(err)
            }
        }
    }

    /// Blocking convenience wrapper over [`save`](Self::save).
    ///
    /// Must not be called from inside an async runtime worker.
    pub fn save_blocking<P>(&mut self, portal: &P) -> Result<()>
    where
        P: RootPortal<Self> + ?Sized,
    {
        futures::executor::block_on(self.save(portal))
    }

    async fn persist<P>(&self, portal: &P) -> Result<Option<Self>>
    where
        P: RootPortal<Self> + ?Sized,
    {
        self.ensure_can_save()?;
        if !self.is_dirty() {
            return Ok(None);
        }
        if self.runtime.policy.validate_parent_links_on_save {
            self.verify_parent_links()?;
        }

        let working = self.clone_graph()?;
        let saved = portal.update_root(working).await?;
        Ok(Some(saved))
    }
}
