use std::fmt;

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::data_types::{CollectionId, DatabaseId, ResourceRid, SubResourceId};
use crate::routing::hash;
use crate::tree::SubResourceKind;

pub mod registry;

pub use registry::TabRegistry;

pub type TabId = Uuid;

#[derive(
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TabKind {
    Documents,
    Settings,
    StoredProcedures,
    UserDefinedFunctions,
    Triggers,
    Query,
    Graph,
    QueryTables,
    MongoShell,
    DatabaseSettings,
    Conflicts,
}

impl TabKind {
    /// Kinds that open on a database rather than on one of its collections
    pub fn is_database_scoped(&self) -> bool {
        matches!(self, TabKind::DatabaseSettings)
    }

    /// Kinds whose tabs can hold an unsaved, not yet persisted item
    pub fn supports_new_item(&self) -> bool {
        self.sub_resource_kind().is_some()
    }

    pub fn sub_resource_kind(&self) -> Option<SubResourceKind> {
        match self {
            TabKind::StoredProcedures => Some(SubResourceKind::StoredProcedure),
            TabKind::Triggers => Some(SubResourceKind::Trigger),
            TabKind::UserDefinedFunctions => Some(SubResourceKind::UserDefinedFunction),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TabKind::Documents => "Items",
            TabKind::Settings => "Settings",
            TabKind::StoredProcedures => "Stored Procedure",
            TabKind::UserDefinedFunctions => "User Defined Function",
            TabKind::Triggers => "Trigger",
            TabKind::Query => "Query",
            TabKind::Graph => "Graph",
            TabKind::QueryTables => "Entities",
            TabKind::MongoShell => "Shell",
            TabKind::DatabaseSettings => "Scale",
            TabKind::Conflicts => "Conflicts",
        }
    }
}

/// Structural identity of a tab. At most one open tab carries a given key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TabKey {
    pub database_id: DatabaseId,
    pub collection_id: Option<CollectionId>,
    pub sub_resource_id: Option<SubResourceId>,
    pub kind: TabKind,
}

impl fmt::Display for TabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.database_id)?;
        if let Some(collection_id) = &self.collection_id {
            write!(f, "/{collection_id}")?;
        }
        if let Some(sub_resource_id) = &self.sub_resource_id {
            write!(f, "/{sub_resource_id}")?;
        }
        write!(f, ":{}", self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TabState {
    Inactive,
    Active,
    Closed,
}

/// What the resolver asks the registry to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabSpec {
    pub key: TabKey,
    pub title: String,
    pub database_rid: ResourceRid,
    pub collection_rid: Option<ResourceRid>,
    pub sub_resource_rid: Option<ResourceRid>,
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab {
    id: TabId,
    key: TabKey,
    title: String,
    database_rid: ResourceRid,
    collection_rid: Option<ResourceRid>,
    sub_resource_rid: Option<ResourceRid>,
    is_new: bool,
    state: TabState,
}

impl Tab {
    pub fn new(spec: TabSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            key: spec.key,
            title: spec.title,
            database_rid: spec.database_rid,
            collection_rid: spec.collection_rid,
            sub_resource_rid: spec.sub_resource_rid,
            is_new: spec.is_new,
            state: TabState::Inactive,
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn key(&self) -> &TabKey {
        &self.key
    }

    pub fn kind(&self) -> TabKind {
        self.key.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn database_rid(&self) -> &str {
        &self.database_rid
    }

    pub fn collection_rid(&self) -> Option<&str> {
        self.collection_rid.as_deref()
    }

    pub fn sub_resource_rid(&self) -> Option<&str> {
        self.sub_resource_rid.as_deref()
    }

    /// An unsaved item that has no sub-resource id yet
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn state(&self) -> TabState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TabState::Active
    }

    /// The hash route that reopens this tab
    pub fn hash_location(&self) -> String {
        hash::location(&self.key, self.is_new)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TabError {
    #[error("Tab {id} is not open")]
    NotOpen { id: TabId },

    #[error("A tab with key {key} is already open")]
    DuplicateKey { key: TabKey },

    #[error("Tab {id} does not hold a new item")]
    NotNewItem { id: TabId },
}

pub type TabResult<T, E = TabError> = Result<T, E>;
