use serde::Serialize;

use crate::data_types::{CollectionId, DatabaseId, SubResourceId};
use crate::tabs::{TabId, TabKind, TabSpec};

pub mod hash;
pub mod resolver;

pub use resolver::TabRouteResolver;

/// A request to show a particular view, e.g. from a deep link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub database_id: Option<DatabaseId>,
    pub collection_id: Option<CollectionId>,
    pub sub_resource_id: Option<SubResourceId>,
    pub tab_kind: TabKind,
    pub is_new_item_request: bool,
}

impl Route {
    pub fn database(database_id: &str, tab_kind: TabKind) -> Self {
        Self {
            database_id: Some(database_id.to_string()),
            collection_id: None,
            sub_resource_id: None,
            tab_kind,
            is_new_item_request: false,
        }
    }

    pub fn collection(database_id: &str, collection_id: &str, tab_kind: TabKind) -> Self {
        Self {
            collection_id: Some(collection_id.to_string()),
            ..Self::database(database_id, tab_kind)
        }
    }

    pub fn sub_resource(
        database_id: &str,
        collection_id: &str,
        sub_resource_id: &str,
        tab_kind: TabKind,
    ) -> Self {
        Self {
            sub_resource_id: Some(sub_resource_id.to_string()),
            ..Self::collection(database_id, collection_id, tab_kind)
        }
    }

    pub fn new_item(database_id: &str, collection_id: &str, tab_kind: TabKind) -> Self {
        Self {
            is_new_item_request: true,
            ..Self::collection(database_id, collection_id, tab_kind)
        }
    }

    /// Whether resolving this route needs the collection's scripts listed
    pub fn needs_collection_children(&self) -> bool {
        self.collection_id.is_some()
            && (self.sub_resource_id.is_some() || self.is_new_item_request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Action {
    ActivateExisting(TabId),
    CreateAndActivate(TabSpec),
    NoOp,
}
