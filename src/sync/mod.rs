use std::collections::HashMap;

use serde::Serialize;

use crate::data_types::ResourceRid;
use crate::repository::interface::{Error as RepositoryError, OfferRecord};
use crate::tree::{Collection, Database, SubResource};

pub mod engine;
pub mod reconcile;

pub use engine::ResourceSyncEngine;
use reconcile::Delta;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Failed fetching resources: {0}")]
    Fetch(#[from] RepositoryError),

    #[error("Database {name:?} doesn't exist")]
    DatabaseDoesNotExist { name: String },

    #[error("Collection {name:?} doesn't exist in database {database:?}")]
    CollectionDoesNotExist { database: String, name: String },
}

pub type SyncResult<T, E = SyncError> = Result<T, E>;

/// Reconciled script lists of one collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptsDelta {
    pub stored_procedures: Delta<SubResource>,
    pub triggers: Delta<SubResource>,
    pub user_defined_functions: Delta<SubResource>,
}

impl ScriptsDelta {
    pub fn change_count(&self) -> usize {
        self.stored_procedures.change_count()
            + self.triggers.change_count()
            + self.user_defined_functions.change_count()
    }
}

// Everything one refresh pass fetched, already diffed against the tree it was
// computed from. Nothing is mutated until the whole plan is applied, so a
// failed fetch leaves the tree untouched.
#[derive(Debug, Default)]
pub struct RefreshPlan {
    pub offers: Vec<OfferRecord>,
    pub databases: Delta<Database>,
    // Keyed by database rid
    pub collections: HashMap<ResourceRid, Delta<Collection>>,
    // Keyed by (database rid, collection rid)
    pub scripts: HashMap<(ResourceRid, ResourceRid), ScriptsDelta>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub databases_added: usize,
    pub databases_removed: usize,
    pub databases_renamed: usize,
    pub collections_added: usize,
    pub collections_removed: usize,
    pub collections_renamed: usize,
    pub scripts_changed: usize,
}

impl RefreshSummary {
    pub fn is_unchanged(&self) -> bool {
        *self == Self::default()
    }
}
