mod common;

use common::{Project, Task, collection_of, record_changes};
use editgraph::prelude::*;
use editgraph::ParentLink;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

#[derive(Debug, Clone, PartialEq)]
struct SavedRecord {
    succeeded: bool,
    has_instance: bool,
    error: Option<String>,
    user_state: Option<serde_json::Value>,
}

fn record_saves(tasks: &mut EditableCollection<Task>) -> Arc<Mutex<Vec<SavedRecord>>> {
    let saves = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&saves);
    tasks.on_saved(move |event| {
        sink.lock().expect("save log").push(SavedRecord {
            succeeded: event.succeeded(),
            has_instance: event.new_instance.is_some(),
            error: event.error.map(|err| err.to_string()),
            user_state: event.user_state.cloned(),
        })
    });
    saves
}

async fn seeded_portal(keys: &[&str]) -> InMemoryDataPortal<Task> {
    let portal = InMemoryDataPortal::new();
    for key in keys {
        portal.seed(&Task::fetched(key)).await.expect("seed task");
    }
    portal
}

fn kinds(operations: &[PortalOperation]) -> Vec<PortalOperationKind> {
    operations.iter().map(|op| op.kind).collect()
}

#[tokio::test]
async fn test_save_flushes_deletes_before_updates() {
    let portal = seeded_portal(&["a", "b", "c"]).await;
    let mut tasks = portal.fetch("tasks").await.expect("fetch");
    assert!(!tasks.is_dirty());

    tasks.edit(1, |task| task.rename("b2")).expect("edit b");
    tasks.remove(0).expect("remove a");
    let created_key = {
        let created = tasks.add_new(&portal).await.expect("add new");
        created.rename("fresh");
        created.key.clone()
    };
    portal.clear_operations().await;

    tasks.save(&portal).await.expect("save");

    let operations = portal.operations().await;
    assert_eq!(
        kinds(&operations),
        vec![
            PortalOperationKind::RootUpdate,
            PortalOperationKind::Delete,
            PortalOperationKind::Update,
            PortalOperationKind::Insert,
        ]
    );
    assert_eq!(operations[1].key, "a");
    assert_eq!(operations[2].key, "b");
    assert_eq!(operations[3].key, created_key);

    assert!(!tasks.is_dirty());
    assert_eq!(tasks.deleted_count(), 0);
    assert!(tasks.iter().all(|task| !task.is_new()));
    assert_eq!(portal.record_count().await, 3);
    assert!(portal.record("a").await.is_none());
    assert_eq!(
        portal.record("b").await.and_then(|value| value["title"].as_str().map(String::from)),
        Some("b2".to_string())
    );
}

#[tokio::test]
async fn test_save_adopts_the_refreshed_instance() {
    let portal = seeded_portal(&["a", "b"]).await;
    let mut tasks = portal.fetch("tasks").await.expect("fetch");
    let changes = record_changes(&mut tasks);
    let before = tasks.node_id();

    tasks.edit(0, |task| task.rename("a2")).expect("edit a");
    tasks.save(&portal).await.expect("save");

    assert_ne!(tasks.node_id(), before);
    assert_eq!(tasks.identity(), 1);
    tasks.verify_parent_links().expect("links point at the adopted instance");

    changes.lock().expect("change log").clear();
    tasks.push(Task::created("c")).expect("push c");
    assert_eq!(changes.lock().expect("change log").len(), 1);
}

#[tokio::test]
async fn test_clean_collection_short_circuits() {
    let portal = seeded_portal(&["a"]).await;
    let mut tasks = portal.fetch("tasks").await.expect("fetch");
    let saves = record_saves(&mut tasks);
    portal.clear_operations().await;
    let before = tasks.node_id();

    assert_ok!(tasks.save(&portal).await);

    assert!(portal.operations().await.is_empty());
    assert_eq!(tasks.node_id(), before);
    let log = saves.lock().expect("save log");
    assert_eq!(log.len(), 1);
    assert!(log[0].succeeded);
    assert!(log[0].has_instance);
}

#[tokio::test]
async fn test_child_collection_cannot_be_saved() {
    let portal = InMemoryDataPortal::<Task>::new();
    let mut tasks: EditableCollection<Task> = EditableCollection::new_child("tasks");
    tasks.push(Task::created("a")).expect("push a");
    tasks
        .edit(0, |task| task.state.add_broken_rule("title is required"))
        .expect("edit a");

    let err = assert_err!(tasks.save(&portal).await);

    assert!(matches!(err, GraphError::ChildSaveNotAllowed(_)));
    assert!(portal.operations().await.is_empty());
}

#[tokio::test]
async fn test_invalid_collection_reports_broken_rules() {
    let portal = InMemoryDataPortal::<Task>::new();
    let mut tasks = collection_of("tasks", vec![Task::created("a"), Task::created("b")]);
    tasks
        .edit(1, |task| {
            task.state.add_broken_rule("title is required");
            task.state.mark_busy();
        })
        .expect("edit b");

    let err = assert_err!(tasks.save(&portal).await);

    match err {
        GraphError::Validation {
            collection,
            broken_rules,
        } => {
            assert_eq!(collection, "tasks");
            assert_eq!(broken_rules, vec!["child 3: title is required".to_string()]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(portal.operations().await.is_empty());
}

#[tokio::test]
async fn test_busy_collection_fails_fast() {
    let portal = InMemoryDataPortal::<Task>::new();
    let mut tasks = collection_of("tasks", vec![Task::created("a")]);
    tasks.edit(0, |task| task.state.mark_busy()).expect("edit a");

    let err = assert_err!(tasks.save(&portal).await);

    assert!(matches!(err, GraphError::BusyObject(_)));
    assert!(portal.operations().await.is_empty());

    tasks.edit(0, |task| task.state.mark_idle()).expect("edit a");
    assert_ok!(tasks.save(&portal).await);
}

#[tokio::test]
async fn test_stray_parent_link_blocks_save() {
    let portal = InMemoryDataPortal::<Task>::new();
    let mut tasks = collection_of("tasks", vec![Task::created("a")]);
    if let Some(task) = tasks.get_mut(0) {
        task.set_parent(ParentLink::none());
    }

    let err = assert_err!(tasks.save(&portal).await);
    assert!(matches!(err, GraphError::InvalidUsage(_)));
    assert!(portal.operations().await.is_empty());

    tasks.set_policy(CollectionPolicy::new().validate_parent_links_on_save(false));
    assert_ok!(tasks.save(&portal).await);
    tasks.verify_parent_links().expect("adopted graph is reconnected");
}

#[tokio::test]
async fn test_failed_save_leaves_graph_untouched() {
    let portal = seeded_portal(&["a", "b"]).await;
    let mut tasks = portal.fetch("tasks").await.expect("fetch");
    let saves = record_saves(&mut tasks);
    tasks.remove(0).expect("remove a");
    tasks.edit(0, |task| task.rename("b2")).expect("edit b");
    portal.fail_on("b").await;
    let before = tasks.node_id();

    let err = tasks
        .save_with_state(&portal, Some(json!({ "request": 7 })))
        .await
        .expect_err("update of b fails");

    assert!(err.is_persistence());
    assert_eq!(tasks.node_id(), before);
    assert_eq!(tasks.deleted_count(), 1);
    assert!(tasks.contains_deleted(2));
    assert!(tasks.is_dirty());
    assert!(tasks.get(0).is_some_and(|task| task.is_dirty()));

    // The delete already reached the store; nothing is rolled back.
    assert!(portal.record("a").await.is_none());

    let log = saves.lock().expect("save log").clone();
    assert_eq!(log.len(), 1);
    assert!(!log[0].succeeded);
    assert!(!log[0].has_instance);
    assert!(log[0].error.as_deref().is_some_and(|msg| msg.contains("'b'")));
    assert_eq!(log[0].user_state, Some(json!({ "request": 7 })));
}

#[tokio::test]
async fn test_retry_after_failure_succeeds() {
    let portal = seeded_portal(&["a"]).await;
    let mut tasks = portal.fetch("tasks").await.expect("fetch");
    tasks.edit(0, |task| task.rename("a2")).expect("edit a");
    portal.fail_on("a").await;

    assert_err!(tasks.save(&portal).await);
    portal.clear_failures().await;
    assert_ok!(tasks.save(&portal).await);

    assert!(!tasks.is_dirty());
}

#[tokio::test]
async fn test_discarded_new_child_never_reaches_portal() {
    let portal = seeded_portal(&["a"]).await;
    let mut tasks = portal.fetch("tasks").await.expect("fetch");
    tasks.push(Task::created("draft")).expect("push draft");
    tasks.remove(1).expect("remove draft");
    assert!(!tasks.is_dirty());
    portal.clear_operations().await;

    assert_ok!(tasks.save(&portal).await);

    assert!(portal.operations().await.is_empty());
    assert!(portal.record("draft").await.is_none());
}

#[tokio::test]
async fn test_update_children_persists_nested_collection() {
    let portal = InMemoryDataPortal::<Task>::new();
    let mut project = Project::fetched("apollo");
    project.tasks.push(Task::created("t1")).expect("push t1");
    project.tasks.push(Task::created("t2")).expect("push t2");
    assert!(project.is_dirty());
    assert!(!project.is_self_dirty());

    project
        .tasks
        .update_children(&portal, &[json!({ "project": "apollo" })])
        .await
        .expect("update children");

    assert!(!project.is_dirty());
    assert!(project.tasks.raise_change_events());
    assert_eq!(portal.record_count().await, 2);
    assert_eq!(
        kinds(&portal.operations().await),
        vec![PortalOperationKind::Insert, PortalOperationKind::Insert]
    );
}

#[tokio::test]
async fn test_update_children_restores_suppression_on_failure() {
    let portal = InMemoryDataPortal::<Task>::new();
    let mut tasks = collection_of("tasks", vec![Task::created("a")]);
    portal.fail_on("a").await;

    assert_err!(tasks.update_children(&portal, &[]).await);

    assert!(tasks.raise_change_events());
    assert!(tasks.is_dirty());
}

#[test]
fn test_blocking_save_wraps_async_save() {
    let portal = InMemoryDataPortal::<Task>::new();
    tokio_test::block_on(portal.seed(&Task::fetched("a"))).expect("seed a");
    let mut tasks = tokio_test::block_on(portal.fetch("tasks")).expect("fetch");
    tasks.edit(0, |task| task.rename("a2")).expect("edit a");

    assert_ok!(tasks.save_blocking(&portal));

    assert!(!tasks.is_dirty());
    let stored = tokio_test::block_on(portal.record("a")).expect("record a");
    assert_eq!(stored["title"], json!("a2"));
}

async fn save_one_new_task(portal: &InMemoryDataPortal<Task>, name: &str) -> String {
    let mut session: EditableCollection<Task> = EditableCollection::new(name);
    let key = {
        let created = session.add_new(portal).await.expect("add new");
        created.rename(name);
        created.key.clone()
    };
    session.save(portal).await.expect("save");
    key
}

#[tokio::test]
async fn test_records_from_separate_sessions_get_distinct_identities() {
    let portal = InMemoryDataPortal::<Task>::new();
    let first = save_one_new_task(&portal, "first").await;
    let second = save_one_new_task(&portal, "second").await;
    assert_ne!(first, second);
    assert_eq!(portal.record_count().await, 2);
    for key in [&first, &second] {
        let stored = portal.record(key).await.expect("stored record");
        assert_eq!(stored["state"]["identity"], 2);
    }

    let mut all = portal.fetch("all").await.expect("fetch all");
    let identities: Vec<_> = all.iter().map(|task| task.identity()).collect();
    assert_eq!(identities, vec![2, 3]);

    let displaced_key = all.get(0).map(|task| task.key.clone()).expect("first record");
    let duplicate = all.get(1).cloned().expect("second record");
    all.replace(0, duplicate).expect("replace");

    assert_eq!(all.deleted_count(), 1);
    assert!(all.contains_deleted(2));
    assert!(all.is_dirty());

    portal.clear_operations().await;
    all.save(&portal).await.expect("save all");
    let operations = portal.operations().await;
    assert_eq!(
        kinds(&operations),
        vec![PortalOperationKind::RootUpdate, PortalOperationKind::Delete]
    );
    assert_eq!(operations[1].key, displaced_key);
    assert!(portal.record(&displaced_key).await.is_none());
}
