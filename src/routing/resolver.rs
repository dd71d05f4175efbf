use std::sync::Arc;

use tracing::debug;

use crate::notify::{ChangeNotifier, NoopHooks};
use crate::routing::{Action, Route};
use crate::tabs::{TabKey, TabRegistry, TabSpec};
use crate::tree::ResourceTree;

/// Maps a route onto either an already open tab or the spec of a new one.
///
/// Misses (unknown database, collection or sub-resource, or an explorer that
/// is not ready yet) are not errors, they resolve to `Action::NoOp`.
#[derive(Clone)]
pub struct TabRouteResolver {
    notifier: Arc<dyn ChangeNotifier>,
}

impl Default for TabRouteResolver {
    fn default() -> Self {
        Self::new(Arc::new(NoopHooks))
    }
}

impl TabRouteResolver {
    pub fn new(notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self { notifier }
    }

    pub fn resolve(
        &self,
        tree: &mut ResourceTree,
        tabs: &TabRegistry,
        route: &Route,
        ready: bool,
    ) -> Action {
        if !ready {
            debug!("Not resolving {route:?}: explorer is not ready");
            return Action::NoOp;
        }

        let Some(database_id) = route.database_id.as_deref() else {
            debug!("Route without a database: {route:?}");
            return Action::NoOp;
        };
        let Some(database) = tree.database(database_id) else {
            debug!("Database {database_id:?} not found");
            return Action::NoOp;
        };
        let database_rid = database.rid.clone();
        let kind = route.tab_kind;

        let mut spec = TabSpec {
            key: TabKey {
                database_id: database_id.to_string(),
                collection_id: None,
                sub_resource_id: None,
                kind,
            },
            title: kind.title().to_string(),
            database_rid,
            collection_rid: None,
            sub_resource_rid: None,
            is_new: false,
        };

        match route.collection_id.as_deref() {
            None if kind.is_database_scoped() => {}
            None => {
                debug!("{kind} tab needs a collection in database {database_id:?}");
                return Action::NoOp;
            }
            Some(collection_id) if kind.is_database_scoped() => {
                debug!("{kind} tab does not open on collection {collection_id:?}");
                return Action::NoOp;
            }
            Some(collection_id) => {
                if route.sub_resource_id.is_some() || route.is_new_item_request {
                    // Expanded even when the sub-resource lookup below misses
                    if tree.set_collection_expanded(database_id, collection_id, true) {
                        self.notifier.tree_changed();
                    }
                }

                let Some(collection) = tree.collection(database_id, collection_id) else {
                    debug!("Collection {collection_id:?} not found in {database_id:?}");
                    return Action::NoOp;
                };
                spec.key.collection_id = Some(collection_id.to_string());
                spec.collection_rid = Some(collection.rid.clone());
                spec.title = format!("{collection_id} {}", kind.title());

                if let Some(sub_resource_id) = route.sub_resource_id.as_deref() {
                    let sub = kind
                        .sub_resource_kind()
                        .and_then(|sub_kind| collection.find_sub_resource(sub_kind, sub_resource_id));
                    let Some(sub) = sub else {
                        debug!(
                            "No {kind} {sub_resource_id:?} in collection {collection_id:?}"
                        );
                        return Action::NoOp;
                    };
                    spec.key.sub_resource_id = Some(sub_resource_id.to_string());
                    spec.sub_resource_rid = Some(sub.rid.clone());
                    spec.title = sub_resource_id.to_string();
                } else if kind.supports_new_item() {
                    // Script kinds open either a saved item or an unsaved one
                    if !route.is_new_item_request {
                        debug!("{kind} tab needs an item or a new-item request");
                        return Action::NoOp;
                    }
                    spec.is_new = true;
                    spec.title = format!("New {}", kind.title());
                }
            }
        }

        let matching = tabs.get_tabs(kind, |tab| {
            tab.key() == &spec.key && (!spec.is_new || tab.is_new())
        });
        match matching.first() {
            Some(tab) => Action::ActivateExisting(tab.id()),
            None => Action::CreateAndActivate(spec),
        }
    }
}
