use rstest::rstest;

use data_explorer::routing::hash::parse_hash;
use data_explorer::routing::{Action, Route, TabRouteResolver};
use data_explorer::tabs::{Tab, TabKind, TabRegistry};

use crate::testutils::loaded_tree;

fn open(tree: &mut data_explorer::tree::ResourceTree, tabs: &mut TabRegistry, route: &Route) {
    match TabRouteResolver::default().resolve(tree, tabs, route, true) {
        Action::CreateAndActivate(spec) => {
            tabs.activate_new(Tab::new(spec)).unwrap();
        }
        other => panic!("expected a new tab, got {other:?}"),
    }
}

#[test]
fn test_active_documents_tab_is_reused() {
    let mut tree = loaded_tree();
    let mut tabs = TabRegistry::default();
    let route = Route::collection("db1", "c1", TabKind::Documents);
    open(&mut tree, &mut tabs, &route);
    let id = tabs.active_tab().unwrap().id();

    let action = TabRouteResolver::default().resolve(&mut tree, &tabs, &route, true);
    assert_eq!(action, Action::ActivateExisting(id));
}

#[test]
fn test_unknown_database_is_a_no_op() {
    let mut tree = loaded_tree();
    let route = Route::database("missing", TabKind::Documents);

    let action =
        TabRouteResolver::default().resolve(&mut tree, &TabRegistry::default(), &route, true);
    assert_eq!(action, Action::NoOp);
}

#[rstest]
#[case::known_collection(Route::collection("db1", "c1", TabKind::Documents))]
#[case::database_only(Route::database("db1", TabKind::Documents))]
#[case::settings(Route::database("db1", TabKind::DatabaseSettings))]
fn test_not_ready_is_a_no_op(#[case] route: Route) {
    let mut tree = loaded_tree();
    let before = tree.clone();

    let action =
        TabRouteResolver::default().resolve(&mut tree, &TabRegistry::default(), &route, false);

    assert_eq!(action, Action::NoOp);
    assert_eq!(tree, before);
}

#[test]
fn test_kinds_do_not_match_each_other() {
    let mut tree = loaded_tree();
    let mut tabs = TabRegistry::default();
    open(
        &mut tree,
        &mut tabs,
        &Route::collection("db1", "c1", TabKind::Settings),
    );

    let action = TabRouteResolver::default().resolve(
        &mut tree,
        &tabs,
        &Route::collection("db1", "c1", TabKind::Conflicts),
        true,
    );
    assert!(matches!(action, Action::CreateAndActivate(_)));
}

#[rstest]
#[case::documents("#/dbs/db1/colls/c1/documents")]
#[case::database_settings("dbs/db2/settings")]
#[case::sproc("dbs/db1/colls/c1/sprocs/sp1")]
#[case::new_udf("dbs/db1/colls/c2/udf")]
#[case::encoded("dbs/db1/colls/c%31/triggers/tr1")]
fn test_hash_round_trips_through_tabs(#[case] hash: &str) {
    let mut tree = loaded_tree();
    let mut tabs = TabRegistry::default();
    let route = parse_hash(hash).unwrap();
    open(&mut tree, &mut tabs, &route);

    let location = tabs.active_tab().unwrap().hash_location();
    assert_eq!(parse_hash(&location), Some(route));
}

#[rstest]
#[case::stored_procedure(TabKind::StoredProcedures, "sp1")]
#[case::trigger(TabKind::Triggers, "tr1")]
#[case::udf(TabKind::UserDefinedFunctions, "udf1")]
fn test_new_item_matches_only_unsaved_tabs(#[case] kind: TabKind, #[case] saved_id: &str) {
    let mut tree = loaded_tree();
    let mut tabs = TabRegistry::default();
    let resolver = TabRouteResolver::default();
    open(
        &mut tree,
        &mut tabs,
        &Route::sub_resource("db1", "c1", saved_id, kind),
    );
    let saved = tabs.active_tab().unwrap().id();

    // No tab of the bare collection-level route exists to collide with
    let plain = Route::collection("db1", "c1", kind);
    assert_eq!(resolver.resolve(&mut tree, &tabs, &plain, true), Action::NoOp);

    let new_item = Route::new_item("db1", "c1", kind);
    open(&mut tree, &mut tabs, &new_item);
    let unsaved = tabs.active_tab().unwrap().id();
    assert_ne!(saved, unsaved);
    assert!(tabs.find(unsaved).unwrap().is_new());

    assert_eq!(resolver.resolve(&mut tree, &tabs, &plain, true), Action::NoOp);
    assert_eq!(
        resolver.resolve(&mut tree, &tabs, &new_item, true),
        Action::ActivateExisting(unsaved)
    );
    assert_eq!(tabs.len(), 2);
}
