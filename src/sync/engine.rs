use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use crate::data_types::ResourceRid;
use crate::repository::interface::{CollectionRecord, Repository, ScriptRecord};
use crate::sync::reconcile::{reconcile, Delta};
use crate::sync::{RefreshPlan, ScriptsDelta, SyncError, SyncResult};
use crate::tree::{
    Collection, Database, NodeRef, ResourceTree, SubResource, SubResourceKind,
};

/// Keeps a `ResourceTree` consistent with the listings served by a
/// `Repository`.
///
/// The engine only ever reads the tree: every pass produces a plan (or a
/// delta) that the owner applies synchronously once all fetches succeeded.
#[derive(Debug, Clone)]
pub struct ResourceSyncEngine {
    repository: Arc<dyn Repository>,
    auto_expand_ceiling: usize,
}

impl ResourceSyncEngine {
    pub fn new(repository: Arc<dyn Repository>, auto_expand_ceiling: usize) -> Self {
        Self {
            repository,
            auto_expand_ceiling,
        }
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repository
    }

    pub fn auto_expand_ceiling(&self) -> usize {
        self.auto_expand_ceiling
    }

    /// Fetch offers and databases, then the collections of every database that
    /// should be loaded and the scripts of every expanded collection in them.
    pub async fn plan_refresh(&self, tree: &ResourceTree) -> SyncResult<RefreshPlan> {
        let (offers, fetched) = futures::try_join!(
            self.repository.list_offers(),
            self.repository.list_databases()
        )?;
        debug!(
            "Fetched {} databases and {} offers",
            fetched.len(),
            offers.len()
        );

        // The fetched listing is the merged set of databases; remember it
        // before the records are consumed by the diff.
        let mut seen = HashSet::new();
        let merged: Vec<NodeRef> = fetched
            .iter()
            .filter(|record| seen.insert(record.rid.clone()))
            .map(|record| NodeRef {
                rid: record.rid.clone(),
                id: record.id.clone(),
            })
            .collect();

        let databases = reconcile(
            tree.databases(),
            fetched,
            Some(self.auto_expand_ceiling),
            |record| Database::new(record, &offers),
        );

        // With few databases everything is loaded, otherwise only the ones
        // the user (or the auto-expansion) opened.
        let load_all = merged.len() <= self.auto_expand_ceiling;
        let to_load: Vec<NodeRef> = merged
            .into_iter()
            .filter(|db| {
                load_all
                    || tree
                        .database_by_rid(&db.rid)
                        .map(|existing| existing.expanded)
                        .unwrap_or_else(|| {
                            databases
                                .to_add
                                .iter()
                                .any(|new| new.rid == db.rid && new.expanded)
                        })
            })
            .collect();
        debug!("Loading collections of {} databases", to_load.len());

        let listings = try_join_all(to_load.into_iter().map(|db| async move {
            let records = self.repository.list_collections(&db.id).await?;
            Ok::<_, SyncError>((db, records))
        }))
        .await?;

        let mut plan = RefreshPlan {
            offers,
            databases,
            ..Default::default()
        };

        let mut script_targets = vec![];
        for (db, records) in listings {
            let current = tree
                .database_by_rid(&db.rid)
                .map(|existing| existing.collections.as_slice())
                .unwrap_or(&[]);

            for record in &records {
                if let Some(collection) = current.iter().find(|c| c.rid == record.rid) {
                    if collection.expanded {
                        script_targets.push((db.clone(), collection, record.id.clone()));
                    }
                }
            }

            let delta = self.reconcile_collections(&db, current, records);
            plan.collections.insert(db.rid, delta);
        }

        let scripts = try_join_all(script_targets.into_iter().map(
            |(db, collection, collection_id)| async move {
                let delta = self
                    .fetch_scripts(&db.id, &collection_id, collection)
                    .await?;
                Ok::<_, SyncError>(((db.rid, collection.rid.clone()), delta))
            },
        ))
        .await?;
        plan.scripts.extend(scripts);

        Ok(plan)
    }

    /// Reload the collections of a single database, e.g. on expansion.
    pub async fn plan_database(
        &self,
        tree: &ResourceTree,
        database_id: &str,
    ) -> SyncResult<(ResourceRid, Delta<Collection>)> {
        let database =
            tree.database(database_id)
                .ok_or_else(|| SyncError::DatabaseDoesNotExist {
                    name: database_id.to_string(),
                })?;

        let records = self.repository.list_collections(&database.id).await?;
        debug!(
            "Fetched {} collections of database {database_id}",
            records.len()
        );

        let delta =
            self.reconcile_collections(&database.node_ref(), &database.collections, records);
        Ok((database.rid.clone(), delta))
    }

    /// Reload the stored procedures, triggers and UDFs of a single collection.
    pub async fn plan_collection(
        &self,
        tree: &ResourceTree,
        database_id: &str,
        collection_id: &str,
    ) -> SyncResult<(NodeRef, NodeRef, ScriptsDelta)> {
        let database =
            tree.database(database_id)
                .ok_or_else(|| SyncError::DatabaseDoesNotExist {
                    name: database_id.to_string(),
                })?;
        let collection = database.collection(collection_id).ok_or_else(|| {
            SyncError::CollectionDoesNotExist {
                database: database_id.to_string(),
                name: collection_id.to_string(),
            }
        })?;

        let delta = self
            .fetch_scripts(database_id, collection_id, collection)
            .await?;
        Ok((database.node_ref(), NodeRef::of(collection), delta))
    }

    fn reconcile_collections(
        &self,
        database: &NodeRef,
        current: &[Collection],
        records: Vec<CollectionRecord>,
    ) -> Delta<Collection> {
        reconcile(current, records, None, |record| {
            Collection::new(database.clone(), record)
        })
    }

    async fn fetch_scripts(
        &self,
        database_id: &str,
        collection_id: &str,
        collection: &Collection,
    ) -> SyncResult<ScriptsDelta> {
        let (stored_procedures, triggers, user_defined_functions) = futures::try_join!(
            self.repository
                .list_stored_procedures(database_id, collection_id),
            self.repository.list_triggers(database_id, collection_id),
            self.repository
                .list_user_defined_functions(database_id, collection_id),
        )?;

        Ok(ScriptsDelta {
            stored_procedures: reconcile_scripts(
                collection,
                SubResourceKind::StoredProcedure,
                stored_procedures,
            ),
            triggers: reconcile_scripts(collection, SubResourceKind::Trigger, triggers),
            user_defined_functions: reconcile_scripts(
                collection,
                SubResourceKind::UserDefinedFunction,
                user_defined_functions,
            ),
        })
    }
}

fn reconcile_scripts(
    collection: &Collection,
    kind: SubResourceKind,
    records: Vec<ScriptRecord>,
) -> Delta<SubResource> {
    reconcile(collection.sub_resources(kind), records, None, |record| {
        SubResource::new(kind, record)
    })
}
