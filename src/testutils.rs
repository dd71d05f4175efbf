#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::notify::{ChangeNotifier, TabHooks};
use crate::repository::interface::{
    CollectionRecord, DatabaseRecord, Error, OfferRecord, Repository, Result,
    ScriptRecord,
};
use crate::repository::memory::{
    CollectionSnapshot, DatabaseSnapshot, InMemoryRepository, Snapshot,
};
use crate::sync::reconcile::{sort_nodes, Delta};
use crate::sync::RefreshPlan;
use crate::tabs::{Tab, TabKey, TabKind, TabSpec};
use crate::tree::{Collection, Database, ResourceTree, SubResource, SubResourceKind};

pub fn database_record(id: &str, rid: &str) -> DatabaseRecord {
    DatabaseRecord {
        id: id.to_string(),
        rid: rid.to_string(),
        self_link: None,
    }
}

pub fn collection_record(id: &str, rid: &str) -> CollectionRecord {
    CollectionRecord {
        id: id.to_string(),
        rid: rid.to_string(),
    }
}

pub fn script_record(id: &str, rid: &str) -> ScriptRecord {
    ScriptRecord {
        id: id.to_string(),
        rid: rid.to_string(),
    }
}

fn collection_snapshot(id: &str, rid: &str) -> CollectionSnapshot {
    CollectionSnapshot {
        record: collection_record(id, rid),
        stored_procedures: vec![],
        triggers: vec![],
        user_defined_functions: vec![],
    }
}

/// db1 (r1) holds c1, with one script of each kind, and c2; db2 (r2) holds c3.
/// db1 is provisioned by offer o1.
pub fn sample_snapshot() -> Snapshot {
    let mut db1 = database_record("db1", "r1");
    db1.self_link = Some("dbs/r1/".to_string());

    Snapshot {
        offers: vec![OfferRecord {
            id: "o1".to_string(),
            resource: "dbs/r1/".to_string(),
            throughput: Some(400),
        }],
        databases: vec![
            DatabaseSnapshot {
                record: db1,
                collections: vec![
                    CollectionSnapshot {
                        stored_procedures: vec![script_record("sp1", "r1-c1-sp1")],
                        triggers: vec![script_record("tr1", "r1-c1-tr1")],
                        user_defined_functions: vec![script_record("udf1", "r1-c1-udf1")],
                        ..collection_snapshot("c1", "r1-c1")
                    },
                    collection_snapshot("c2", "r1-c2"),
                ],
            },
            DatabaseSnapshot {
                record: database_record("db2", "r2"),
                collections: vec![collection_snapshot("c3", "r2-c3")],
            },
        ],
    }
}

/// A tree holding everything in `snapshot`, every level loaded and collapsed
pub fn tree_from_snapshot(snapshot: &Snapshot) -> ResourceTree {
    let databases = snapshot
        .databases
        .iter()
        .map(|db| {
            let mut database = Database::new(db.record.clone(), &snapshot.offers);
            database.collections = db
                .collections
                .iter()
                .map(|coll| {
                    let mut collection =
                        Collection::new(database.node_ref(), coll.record.clone());
                    collection.stored_procedures =
                        sub_resources(SubResourceKind::StoredProcedure, &coll.stored_procedures);
                    collection.triggers =
                        sub_resources(SubResourceKind::Trigger, &coll.triggers);
                    collection.user_defined_functions = sub_resources(
                        SubResourceKind::UserDefinedFunction,
                        &coll.user_defined_functions,
                    );
                    collection.children_loaded = true;
                    collection
                })
                .collect();
            sort_nodes(&mut database.collections);
            database.collections_loaded = true;
            database
        })
        .collect();

    let mut tree = ResourceTree::new();
    tree.apply_plan(RefreshPlan {
        offers: snapshot.offers.clone(),
        databases: Delta {
            to_add: databases,
            ..Default::default()
        },
        ..Default::default()
    });
    tree
}

fn sub_resources(kind: SubResourceKind, records: &[ScriptRecord]) -> Vec<SubResource> {
    let mut nodes: Vec<SubResource> = records
        .iter()
        .cloned()
        .map(|record| SubResource::new(kind, record))
        .collect();
    sort_nodes(&mut nodes);
    nodes
}

pub fn loaded_tree() -> ResourceTree {
    tree_from_snapshot(&sample_snapshot())
}

/// A spec with made-up rids, for registry tests that never look at the tree
pub fn tab_spec(
    database_id: &str,
    collection_id: Option<&str>,
    sub_resource_id: Option<&str>,
    kind: TabKind,
) -> TabSpec {
    TabSpec {
        key: TabKey {
            database_id: database_id.to_string(),
            collection_id: collection_id.map(str::to_string),
            sub_resource_id: sub_resource_id.map(str::to_string),
            kind,
        },
        title: kind.title().to_string(),
        database_rid: format!("rid-{database_id}"),
        collection_rid: collection_id.map(|id| format!("rid-{database_id}-{id}")),
        sub_resource_rid: sub_resource_id.map(|id| format!("rid-{id}")),
        is_new: false,
    }
}

/// Serves the wrapped snapshot, except for the listings it was told to fail
#[derive(Debug)]
pub struct FailingRepository {
    inner: InMemoryRepository,
    fail_databases: bool,
    fail_collections: bool,
}

impl FailingRepository {
    pub fn failing_databases(snapshot: Snapshot) -> Self {
        Self {
            inner: InMemoryRepository::new(snapshot),
            fail_databases: true,
            fail_collections: false,
        }
    }

    pub fn failing_collections(snapshot: Snapshot) -> Self {
        Self {
            inner: InMemoryRepository::new(snapshot),
            fail_databases: false,
            fail_collections: true,
        }
    }

    fn unavailable<T>(listing: &str) -> Result<T> {
        Err(Error::Unavailable {
            reason: format!("{listing} listing failed"),
        })
    }
}

#[async_trait]
impl Repository for FailingRepository {
    async fn list_offers(&self) -> Result<Vec<OfferRecord>> {
        self.inner.list_offers().await
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseRecord>> {
        if self.fail_databases {
            return Self::unavailable("database");
        }
        self.inner.list_databases().await
    }

    async fn list_collections(&self, database_id: &str) -> Result<Vec<CollectionRecord>> {
        if self.fail_collections {
            return Self::unavailable("collection");
        }
        self.inner.list_collections(database_id).await
    }

    async fn list_stored_procedures(
        &self,
        database_id: &str,
        collection_id: &str,
    ) -> Result<Vec<ScriptRecord>> {
        self.inner
            .list_stored_procedures(database_id, collection_id)
            .await
    }

    async fn list_triggers(
        &self,
        database_id: &str,
        collection_id: &str,
    ) -> Result<Vec<ScriptRecord>> {
        self.inner.list_triggers(database_id, collection_id).await
    }

    async fn list_user_defined_functions(
        &self,
        database_id: &str,
        collection_id: &str,
    ) -> Result<Vec<ScriptRecord>> {
        self.inner
            .list_user_defined_functions(database_id, collection_id)
            .await
    }
}

/// Records every hook and notification as a line of text, in call order
#[derive(Debug, Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<String>>,
}

impl RecordingHooks {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    fn record(&self, event: String) {
        self.events.lock().push(event);
    }
}

impl TabHooks for RecordingHooks {
    fn on_activate(&self, tab: &Tab) {
        self.record(format!("activate {}", tab.key()));
    }

    fn on_deactivate(&self, tab: &Tab) {
        self.record(format!("deactivate {}", tab.key()));
    }
}

impl ChangeNotifier for RecordingHooks {
    fn tree_changed(&self) {
        self.record("tree_changed".to_string());
    }

    fn tabs_changed(&self) {
        self.record("tabs_changed".to_string());
    }
}
