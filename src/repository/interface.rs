use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::data_types::{ResourceRid, Throughput};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRecord {
    pub id: String,
    #[serde(rename = "_rid")]
    pub rid: ResourceRid,
    /// Self link, used to associate offers with their database
    #[serde(rename = "_self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CollectionRecord {
    pub id: String,
    #[serde(rename = "_rid")]
    pub rid: ResourceRid,
}

/// A stored procedure, trigger or user-defined function listing entry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScriptRecord {
    pub id: String,
    #[serde(rename = "_rid")]
    pub rid: ResourceRid,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OfferRecord {
    pub id: String,
    /// Self link of the resource this offer provisions
    pub resource: String,
    #[serde(default)]
    pub throughput: Option<Throughput>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Resource listing unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Database {name:?} doesn't exist")]
    DatabaseNotFound { name: String },

    #[error("Collection {name:?} doesn't exist in database {database:?}")]
    CollectionNotFound { database: String, name: String },

    #[error("Failed parsing JSON: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The fetch collaborator: lists resources from the backing store.
///
/// Retries and endpoint failover belong to the implementation; callers see a
/// single success or failure per listing.
#[async_trait]
pub trait Repository: Send + Sync + Debug {
    async fn list_offers(&self) -> Result<Vec<OfferRecord>> {
        Ok(vec![])
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseRecord>>;

    async fn list_collections(&self, database_id: &str) -> Result<Vec<CollectionRecord>>;

    async fn list_stored_procedures(
        &self,
        database_id: &str,
        collection_id: &str,
    ) -> Result<Vec<ScriptRecord>>;

    async fn list_triggers(
        &self,
        database_id: &str,
        collection_id: &str,
    ) -> Result<Vec<ScriptRecord>>;

    async fn list_user_defined_functions(
        &self,
        database_id: &str,
        collection_id: &str,
    ) -> Result<Vec<ScriptRecord>>;
}
