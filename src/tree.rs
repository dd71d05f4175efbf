use std::fmt;

use serde::Serialize;
use strum_macros::{AsRefStr, Display};

use crate::data_types::{ResourceRid, Throughput};
use crate::repository::interface::{
    CollectionRecord, DatabaseRecord, OfferRecord, ScriptRecord,
};
use crate::sync::reconcile::{self, ResourceNode, ResourceRecord};
use crate::sync::{RefreshPlan, RefreshSummary, ScriptsDelta};

/// The (rid, id) identity of a node, also used as a non-owning back reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NodeRef {
    pub rid: ResourceRid,
    pub id: String,
}

impl NodeRef {
    pub fn of<N: ResourceNode>(node: &N) -> Self {
        Self {
            rid: node.rid().to_string(),
            id: node.id().to_string(),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.rid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offer {
    pub id: String,
    pub throughput: Option<Throughput>,
}

impl From<&OfferRecord> for Offer {
    fn from(offer: &OfferRecord) -> Self {
        Self {
            id: offer.id.clone(),
            throughput: offer.throughput,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Database {
    pub rid: ResourceRid,
    pub id: String,
    pub self_link: Option<String>,
    pub offer: Option<Offer>,
    pub collections: Vec<Collection>,
    pub expanded: bool,
    /// Whether `collections` reflects at least one listing
    pub collections_loaded: bool,
}

impl Database {
    pub fn new(record: DatabaseRecord, offers: &[OfferRecord]) -> Self {
        let offer = find_offer(offers, record.self_link.as_deref());
        Self {
            rid: record.rid,
            id: record.id,
            self_link: record.self_link,
            offer,
            collections: vec![],
            expanded: false,
            collections_loaded: false,
        }
    }

    pub fn collection(&self, collection_id: &str) -> Option<&Collection> {
        self.collections.iter().find(|coll| coll.id == collection_id)
    }

    pub(crate) fn collection_mut(&mut self, collection_id: &str) -> Option<&mut Collection> {
        self.collections.iter_mut().find(|coll| coll.id == collection_id)
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef::of(self)
    }
}

fn find_offer(offers: &[OfferRecord], self_link: Option<&str>) -> Option<Offer> {
    let self_link = self_link?;
    offers
        .iter()
        .find(|offer| offer.resource == self_link)
        .map(Offer::from)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collection {
    pub rid: ResourceRid,
    pub id: String,
    /// The owning database; kept in sync on rename
    pub database: NodeRef,
    pub stored_procedures: Vec<SubResource>,
    pub triggers: Vec<SubResource>,
    pub user_defined_functions: Vec<SubResource>,
    pub expanded: bool,
    /// Whether the script lists reflect at least one listing
    pub children_loaded: bool,
}

impl Collection {
    pub fn new(database: NodeRef, record: CollectionRecord) -> Self {
        Self {
            rid: record.rid,
            id: record.id,
            database,
            stored_procedures: vec![],
            triggers: vec![],
            user_defined_functions: vec![],
            expanded: false,
            children_loaded: false,
        }
    }

    pub fn sub_resources(&self, kind: SubResourceKind) -> &[SubResource] {
        match kind {
            SubResourceKind::StoredProcedure => &self.stored_procedures,
            SubResourceKind::Trigger => &self.triggers,
            SubResourceKind::UserDefinedFunction => &self.user_defined_functions,
        }
    }

    pub fn find_sub_resource(
        &self,
        kind: SubResourceKind,
        id: &str,
    ) -> Option<&SubResource> {
        self.sub_resources(kind).iter().find(|sub| sub.id == id)
    }

    pub(crate) fn apply_scripts(&mut self, delta: ScriptsDelta) -> usize {
        let changes = delta.change_count();
        reconcile::apply(&mut self.stored_procedures, delta.stored_procedures);
        reconcile::apply(&mut self.triggers, delta.triggers);
        reconcile::apply(&mut self.user_defined_functions, delta.user_defined_functions);
        self.children_loaded = true;
        changes
    }
}

#[derive(AsRefStr, Display, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[strum(serialize_all = "snake_case")]
pub enum SubResourceKind {
    StoredProcedure,
    Trigger,
    UserDefinedFunction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubResource {
    pub rid: ResourceRid,
    pub id: String,
    pub kind: SubResourceKind,
}

impl SubResource {
    pub fn new(kind: SubResourceKind, record: ScriptRecord) -> Self {
        Self {
            rid: record.rid,
            id: record.id,
            kind,
        }
    }
}

impl ResourceNode for Database {
    fn rid(&self) -> &str {
        &self.rid
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn rename(&mut self, id: String) {
        for collection in self.collections.iter_mut() {
            collection.database.id = id.clone();
        }
        self.id = id;
    }

    fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }
}

impl ResourceNode for Collection {
    fn rid(&self) -> &str {
        &self.rid
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn rename(&mut self, id: String) {
        self.id = id;
    }

    fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }
}

impl ResourceNode for SubResource {
    fn rid(&self) -> &str {
        &self.rid
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn rename(&mut self, id: String) {
        self.id = id;
    }
}

impl ResourceRecord for DatabaseRecord {
    fn rid(&self) -> &str {
        &self.rid
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl ResourceRecord for CollectionRecord {
    fn rid(&self) -> &str {
        &self.rid
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl ResourceRecord for ScriptRecord {
    fn rid(&self) -> &str {
        &self.rid
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// The Database → Collection → script forest shown by the resource tree.
///
/// Mutated only through `apply_plan` and the expansion toggles; everything
/// else is a read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceTree {
    databases: Vec<Database>,
}

impl ResourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn databases(&self) -> &[Database] {
        &self.databases
    }

    /// Exact, case-sensitive lookup by user-facing id
    pub fn database(&self, database_id: &str) -> Option<&Database> {
        self.databases.iter().find(|db| db.id == database_id)
    }

    pub(crate) fn database_mut(&mut self, database_id: &str) -> Option<&mut Database> {
        self.databases.iter_mut().find(|db| db.id == database_id)
    }

    pub fn database_by_rid(&self, rid: &str) -> Option<&Database> {
        self.databases.iter().find(|db| db.rid == rid)
    }

    pub fn collection(&self, database_id: &str, collection_id: &str) -> Option<&Collection> {
        self.database(database_id)?.collection(collection_id)
    }

    pub(crate) fn collection_mut(
        &mut self,
        database_id: &str,
        collection_id: &str,
    ) -> Option<&mut Collection> {
        self.database_mut(database_id)?.collection_mut(collection_id)
    }

    /// Returns whether the flag actually changed
    pub(crate) fn set_database_expanded(&mut self, database_id: &str, expanded: bool) -> bool {
        match self.database_mut(database_id) {
            Some(database) if database.expanded != expanded => {
                database.expanded = expanded;
                true
            }
            _ => false,
        }
    }

    /// Returns whether the flag actually changed
    pub(crate) fn set_collection_expanded(
        &mut self,
        database_id: &str,
        collection_id: &str,
        expanded: bool,
    ) -> bool {
        match self.collection_mut(database_id, collection_id) {
            Some(collection) if collection.expanded != expanded => {
                collection.expanded = expanded;
                true
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Merge a plan computed against the current state of this tree.
    pub fn apply_plan(&mut self, plan: RefreshPlan) -> RefreshSummary {
        let RefreshPlan {
            offers,
            databases,
            mut collections,
            mut scripts,
        } = plan;

        let mut summary = RefreshSummary {
            databases_added: databases.to_add.len(),
            databases_removed: databases.to_remove.len(),
            databases_renamed: databases.to_rename.len(),
            ..Default::default()
        };

        reconcile::apply(&mut self.databases, databases);

        for database in self.databases.iter_mut() {
            // Offers are listed in full on every refresh and can be provisioned
            // or removed independently of their database
            database.offer = find_offer(&offers, database.self_link.as_deref());

            if let Some(delta) = collections.remove(&database.rid) {
                summary.collections_added += delta.to_add.len();
                summary.collections_removed += delta.to_remove.len();
                summary.collections_renamed += delta.to_rename.len();
                reconcile::apply(&mut database.collections, delta);
                database.collections_loaded = true;
            }

            for collection in database.collections.iter_mut() {
                let key = (database.rid.clone(), collection.rid.clone());
                if let Some(delta) = scripts.remove(&key) {
                    summary.scripts_changed += collection.apply_scripts(delta);
                }
            }
        }

        self.debug_check_invariants();
        summary
    }

    pub(crate) fn apply_collections(
        &mut self,
        database_rid: &str,
        delta: reconcile::Delta<Collection>,
    ) -> bool {
        match self.databases.iter_mut().find(|db| db.rid == database_rid) {
            Some(database) => {
                reconcile::apply(&mut database.collections, delta);
                database.collections_loaded = true;
                self.debug_check_invariants();
                true
            }
            None => false,
        }
    }

    pub(crate) fn apply_scripts(
        &mut self,
        database_rid: &str,
        collection_rid: &str,
        delta: ScriptsDelta,
    ) -> bool {
        let collection = self
            .databases
            .iter_mut()
            .find(|db| db.rid == database_rid)
            .and_then(|db| db.collections.iter_mut().find(|c| c.rid == collection_rid));

        match collection {
            Some(collection) => {
                collection.apply_scripts(delta);
                true
            }
            None => false,
        }
    }

    /// Every collection points back at the database that holds it, and no
    /// rid appears twice among siblings.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut database_rids = std::collections::HashSet::new();
        for database in &self.databases {
            if !database_rids.insert(database.rid.as_str()) {
                return Err(format!("Duplicate database rid {}", database.rid));
            }

            let mut collection_rids = std::collections::HashSet::new();
            for collection in &database.collections {
                if collection.database != database.node_ref() {
                    return Err(format!(
                        "Collection {} points at {} instead of {}",
                        collection.rid,
                        collection.database,
                        database.node_ref()
                    ));
                }
                if !collection_rids.insert(collection.rid.as_str()) {
                    return Err(format!("Duplicate collection rid {}", collection.rid));
                }
            }
        }
        Ok(())
    }

    fn debug_check_invariants(&self) {
        if cfg!(debug_assertions) {
            if let Err(e) = self.check_invariants() {
                panic!("Resource tree invariant violated: {e}");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn from_databases(databases: Vec<Database>) -> Self {
        Self { databases }
    }
}
