use super::{ChildPortal, RootPortal};
use crate::collection::EditableCollection;
use crate::core::{GraphError, Result};
use crate::entity::EditableChild;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashSet};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{Level, event};

/// Child type the in-memory portal can store.
pub trait PortalRecord: EditableChild + Serialize + Send + Sync {
    /// Key the record is stored under. Must not depend on the graph identity.
    fn record_key(&self) -> String;

    /// Blank instance handed out by `create_child`.
    fn blank() -> Self
    where
        Self: Sized;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortalOperationKind {
    Create,
    Fetch,
    Insert,
    Update,
    Delete,
    RootUpdate,
}

/// One entry of the portal journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalOperation {
    pub kind: PortalOperationKind,
    pub key: String,
}

impl PortalOperation {
    fn new(kind: PortalOperationKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }
}

#[derive(Default)]
struct PortalStore {
    records: BTreeMap<String, serde_json::Value>,
    journal: Vec<PortalOperation>,
    failing_keys: HashSet<String>,
}

/// In-memory data portal for tests and demos.
///
/// Records are kept as JSON keyed by [`PortalRecord::record_key`]. Every
/// call is appended to a journal so callers can assert on ordering, and
/// individual keys can be set up to fail.
pub struct InMemoryDataPortal<C> {
    store: Arc<Mutex<PortalStore>>,
    _records: PhantomData<fn() -> C>,
}

impl<C> Clone for InMemoryDataPortal<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _records: PhantomData,
        }
    }
}

impl<C> Default for InMemoryDataPortal<C> {
    fn default() -> Self {
        Self {
            store: Arc::new(Mutex::new(PortalStore::default())),
            _records: PhantomData,
        }
    }
}

impl<C: PortalRecord> InMemoryDataPortal<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `child` as an already persisted record without journaling it.
    pub async fn seed(&self, child: &C) -> Result<()> {
        let value = serde_json::to_value(child)?;
        let mut store = self.store.lock().await;
        store.records.insert(child.record_key(), value);
        Ok(())
    }

    /// Makes every later insert, update or delete of `key` fail.
    pub async fn fail_on(&self, key: impl Into<String>) {
        self.store.lock().await.failing_keys.insert(key.into());
    }

    pub async fn clear_failures(&self) {
        self.store.lock().await.failing_keys.clear();
    }

    pub async fn record(&self, key: &str) -> Option<serde_json::Value> {
        self.store.lock().await.records.get(key).cloned()
    }

    pub async fn record_count(&self) -> usize {
        self.store.lock().await.records.len()
    }

    pub async fn operations(&self) -> Vec<PortalOperation> {
        self.store.lock().await.journal.clone()
    }

    pub async fn clear_operations(&self) {
        self.store.lock().await.journal.clear();
    }

    /// Loads every stored record into a new root collection.
    ///
    /// Fetched children are old and clean.
    pub async fn fetch(&self, name: &str) -> Result<EditableCollection<C>>
    where
        C: DeserializeOwned,
    {
        let values: Vec<serde_json::Value> = {
            let mut store = self.store.lock().await;
            store
                .journal
                .push(PortalOperation::new(PortalOperationKind::Fetch, name));
            store.records.values().cloned().collect()
        };

        let mut collection = EditableCollection::new(name);
        collection.with_change_events_suppressed(|collection| {
            for value in values {
                let mut child: C = serde_json::from_value(value)?;
                child.mark_as_child();
                child.mark_old();
                collection.push(child)?;
            }
            Ok::<_, GraphError>(())
        })?;
        event!(
            Level::DEBUG,
            collection = name,
            children = collection.len(),
            "collection fetched"
        );
        Ok(collection)
    }

    fn ensure_writable(store: &PortalStore, key: &str) -> Result<()> {
        if store.failing_keys.contains(key) {
            event!(Level::WARN, key, "injected persistence failure");
            return Err(GraphError::Persistence(format!(
                "record '{}' rejected by the data store",
                key
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<C: PortalRecord> ChildPortal<C> for InMemoryDataPortal<C> {
    async fn create_child(&self) -> Result<C> {
        let mut child = C::blank();
        child.mark_as_child();
        child.mark_new();
        self.store
            .lock()
            .await
            .journal
            .push(PortalOperation::new(
                PortalOperationKind::Create,
                child.record_key(),
            ));
        Ok(child)
    }

    async fn update_child(&self, child: &mut C, _params: &[serde_json::Value]) -> Result<()> {
        let key = child.record_key();
        let mut store = self.store.lock().await;
        Self::ensure_writable(&store, &key)?;

        if child.is_deleted() {
            if !child.is_new() {
                store.records.remove(&key);
                store
                    .journal
                    .push(PortalOperation::new(PortalOperationKind::Delete, &key));
                event!(Level::TRACE, key = %key, "record deleted");
            }
            child.mark_new();
            return Ok(());
        }

        if child.is_new() {
            if store.records.contains_key(&key) {
                return Err(GraphError::Persistence(format!(
                    "record '{}' already exists",
                    key
                )));
            }
            child.mark_old();
            let value = serde_json::to_value(&*child)?;
            store.records.insert(key.clone(), value);
            store
                .journal
                .push(PortalOperation::new(PortalOperationKind::Insert, &key));
            event!(Level::TRACE, key = %key, "record inserted");
            return Ok(());
        }

        if !store.records.contains_key(&key) {
            return Err(GraphError::Persistence(format!(
                "record '{}' does not exist",
                key
            )));
        }
        child.mark_old();
        let value = serde_json::to_value(&*child)?;
        store.records.insert(key.clone(), value);
        store
            .journal
            .push(PortalOperation::new(PortalOperationKind::Update, &key));
        event!(Level::TRACE, key = %key, "record updated");
        Ok(())
    }
}

#[async_trait]
impl<C: PortalRecord> RootPortal<EditableCollection<C>> for InMemoryDataPortal<C> {
    async fn update_root(&self, mut root: EditableCollection<C>) -> Result<EditableCollection<C>> {
        self.store
            .lock()
            .await
            .journal
            .push(PortalOperation::new(
                PortalOperationKind::RootUpdate,
                root.name(),
            ));
        root.update_children(self, &[]).await?;
        Ok(root)
    }
}
