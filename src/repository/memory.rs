use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::repository::interface::{
    CollectionRecord, DatabaseRecord, Error, OfferRecord, Repository, Result,
    ScriptRecord,
};

/// A point-in-time listing of an account, as served by `InMemoryRepository`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    #[serde(default)]
    pub offers: Vec<OfferRecord>,
    #[serde(default)]
    pub databases: Vec<DatabaseSnapshot>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSnapshot {
    #[serde(flatten)]
    pub record: DatabaseRecord,
    #[serde(default)]
    pub collections: Vec<CollectionSnapshot>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSnapshot {
    #[serde(flatten)]
    pub record: CollectionRecord,
    #[serde(default)]
    pub stored_procedures: Vec<ScriptRecord>,
    #[serde(default)]
    pub triggers: Vec<ScriptRecord>,
    #[serde(default)]
    pub user_defined_functions: Vec<ScriptRecord>,
}

impl Snapshot {
    fn database(&self, database_id: &str) -> Result<&DatabaseSnapshot> {
        self.databases
            .iter()
            .find(|db| db.record.id == database_id)
            .ok_or_else(|| Error::DatabaseNotFound {
                name: database_id.to_string(),
            })
    }

    fn collection(
        &self,
        database_id: &str,
        collection_id: &str,
    ) -> Result<&CollectionSnapshot> {
        self.database(database_id)?
            .collections
            .iter()
            .find(|coll| coll.record.id == collection_id)
            .ok_or_else(|| Error::CollectionNotFound {
                database: database_id.to_string(),
                name: collection_id.to_string(),
            })
    }
}

// Serves listings out of a mutable snapshot; stands in for the database SDK
// in tests and in the CLI.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    snapshot: RwLock<Snapshot>,
}

impl InMemoryRepository {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Snapshot {
        self.snapshot.read().clone()
    }

    /// Edit the served listing, e.g. to simulate resources created or deleted
    /// by another client between two refreshes.
    pub fn update<F: FnOnce(&mut Snapshot)>(&self, f: F) {
        f(&mut *self.snapshot.write())
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_offers(&self) -> Result<Vec<OfferRecord>> {
        Ok(self.snapshot.read().offers.clone())
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseRecord>> {
        Ok(self
            .snapshot
            .read()
            .databases
            .iter()
            .map(|db| db.record.clone())
            .collect())
    }

    async fn list_collections(&self, database_id: &str) -> Result<Vec<CollectionRecord>> {
        Ok(self
            .snapshot
            .read()
            .database(database_id)?
            .collections
            .iter()
            .map(|coll| coll.record.clone())
            .collect())
    }

    async fn list_stored_procedures(
        &self,
        database_id: &str,
        collection_id: &str,
    ) -> Result<Vec<ScriptRecord>> {
        Ok(self
            .snapshot
            .read()
            .collection(database_id, collection_id)?
            .stored_procedures
            .clone())
    }

    async fn list_triggers(
        &self,
        database_id: &str,
        collection_id: &str,
    ) -> Result<Vec<ScriptRecord>> {
        Ok(self
            .snapshot
            .read()
            .collection(database_id, collection_id)?
            .triggers
            .clone())
    }

    async fn list_user_defined_functions(
        &self,
        database_id: &str,
        collection_id: &str,
    ) -> Result<Vec<ScriptRecord>> {
        Ok(self
            .snapshot
            .read()
            .collection(database_id, collection_id)?
            .user_defined_functions
            .clone())
    }
}
