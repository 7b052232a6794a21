#![allow(dead_code)]

use editgraph::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

static NEXT_BLANK: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub key: String,
    pub title: String,
    pub state: ChildState,
}

impl Task {
    /// A task that was never persisted.
    pub fn created(key: &str) -> Self {
        Self {
            key: key.to_string(),
            title: key.to_string(),
            state: ChildState::new_child(),
        }
    }

    /// A task as loaded from the store.
    pub fn fetched(key: &str) -> Self {
        Self {
            key: key.to_string(),
            title: key.to_string(),
            state: ChildState::fetched_child(),
        }
    }

    pub fn rename(&mut self, title: &str) {
        self.title = title.to_string();
        self.state.mark_dirty();
    }
}

impl_editable_child!(Task, state);

impl PortalRecord for Task {
    fn record_key(&self) -> String {
        self.key.clone()
    }

    fn blank() -> Self {
        let n = NEXT_BLANK.fetch_add(1, Ordering::SeqCst);
        Self {
            key: format!("blank-{}", n),
            title: String::new(),
            state: ChildState::new(),
        }
    }
}

/// A project owning a nested task collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub key: String,
    pub tasks: EditableCollection<Task>,
    pub state: ChildState,
}

impl Project {
    pub fn fetched(key: &str) -> Self {
        Self {
            key: key.to_string(),
            tasks: EditableCollection::new_child(format!("{}-tasks", key)),
            state: ChildState::fetched_child(),
        }
    }
}

impl_editable_child!(Project, state, children: [tasks]);

pub fn collection_of(name: &str, tasks: Vec<Task>) -> EditableCollection<Task> {
    let mut collection = EditableCollection::new(name);
    for task in tasks {
        collection.push(task).expect("push task");
    }
    collection
}

pub fn record_changes<C>(collection: &mut EditableCollection<C>) -> Arc<Mutex<Vec<CollectionChange>>> {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    collection.on_change(move |change| sink.lock().expect("change log").push(change.clone()));
    changes
}

pub fn actions(changes: &Arc<Mutex<Vec<CollectionChange>>>) -> Vec<ChangeAction> {
    changes
        .lock()
        .expect("change log")
        .iter()
        .map(|change| change.action)
        .collect()
}
