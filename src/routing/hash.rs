use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::routing::Route;
use crate::tabs::{TabKey, TabKind};

// Characters that would break a path segment of the hash
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?');

/// Parse a location hash such as `#/dbs/db1/colls/c1/sprocs/sp1`.
pub fn parse_hash(hash: &str) -> Option<Route> {
    let path = hash.trim_start_matches('#').trim_matches('/');
    let segments = path
        .split('/')
        .map(|segment| percent_decode_str(segment).decode_utf8().ok())
        .collect::<Option<Vec<Cow<str>>>>()?;
    if segments.iter().any(|segment| segment.is_empty()) {
        return None;
    }
    let segments: Vec<&str> = segments.iter().map(|segment| &**segment).collect();

    let route = match segments.as_slice() {
        ["dbs", db, "settings"] => Route::database(db, TabKind::DatabaseSettings),
        ["dbs", db, "colls", coll, "sproc"] => {
            Route::new_item(db, coll, TabKind::StoredProcedures)
        }
        ["dbs", db, "colls", coll, "trigger"] => Route::new_item(db, coll, TabKind::Triggers),
        ["dbs", db, "colls", coll, "udf"] => {
            Route::new_item(db, coll, TabKind::UserDefinedFunctions)
        }
        ["dbs", db, "colls", coll, view] => Route::collection(db, coll, collection_view(view)?),
        ["dbs", db, "colls", coll, "sprocs", id] => {
            Route::sub_resource(db, coll, id, TabKind::StoredProcedures)
        }
        ["dbs", db, "colls", coll, "triggers", id] => {
            Route::sub_resource(db, coll, id, TabKind::Triggers)
        }
        ["dbs", db, "colls", coll, "udfs", id] => {
            Route::sub_resource(db, coll, id, TabKind::UserDefinedFunctions)
        }
        _ => return None,
    };
    Some(route)
}

fn collection_view(view: &str) -> Option<TabKind> {
    let kind = match view {
        "documents" | "mongoDocuments" => TabKind::Documents,
        "entities" => TabKind::QueryTables,
        "graphs" => TabKind::Graph,
        "query" | "mongoQuery" => TabKind::Query,
        "mongoShell" => TabKind::MongoShell,
        "settings" => TabKind::Settings,
        "conflicts" => TabKind::Conflicts,
        _ => return None,
    };
    Some(kind)
}

/// The hash that reopens a tab with this key.
pub fn location(key: &TabKey, is_new: bool) -> String {
    let mut hash = format!("dbs/{}", encode(&key.database_id));
    let Some(collection_id) = &key.collection_id else {
        if key.kind.is_database_scoped() {
            hash.push_str("/settings");
        }
        return hash;
    };
    hash.push_str(&format!("/colls/{}/", encode(collection_id)));

    let (new_item, listing) = match key.kind {
        TabKind::StoredProcedures => ("sproc", "sprocs"),
        TabKind::Triggers => ("trigger", "triggers"),
        TabKind::UserDefinedFunctions => ("udf", "udfs"),
        TabKind::Documents => ("documents", "documents"),
        TabKind::QueryTables => ("entities", "entities"),
        TabKind::Graph => ("graphs", "graphs"),
        TabKind::Query => ("query", "query"),
        TabKind::MongoShell => ("mongoShell", "mongoShell"),
        TabKind::Settings | TabKind::DatabaseSettings => ("settings", "settings"),
        TabKind::Conflicts => ("conflicts", "conflicts"),
    };

    match (&key.sub_resource_id, key.kind.supports_new_item()) {
        (Some(id), true) if !is_new => {
            hash.push_str(listing);
            hash.push('/');
            hash.push_str(&encode(id));
        }
        _ => hash.push_str(new_item),
    }
    hash
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}
