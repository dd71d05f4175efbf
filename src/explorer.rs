use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::schema;
use crate::notify::{ChangeNotifier, TabHooks};
use crate::repository::interface::Repository;
use crate::routing::hash::parse_hash;
use crate::routing::{Action, Route, TabRouteResolver};
use crate::sync::{RefreshSummary, ResourceSyncEngine, SyncError};
use crate::tabs::{Tab, TabError, TabRegistry};
use crate::tree::ResourceTree;

#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("A refresh of the resource tree is already in progress")]
    RefreshInProgress,

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Tab(#[from] TabError),
}

pub type ExplorerResult<T, E = ExplorerError> = Result<T, E>;

/// Set while a refresh pass runs.
///
/// Clones share one flag: a UI can watch it through [`Explorer::refresh_gate`],
/// and a background task that refreshes the same account can hold it to keep
/// the explorer's own refreshes (and route resolution) out until it is done.
#[derive(Debug, Clone, Default)]
pub struct RefreshGate(Arc<AtomicBool>);

/// Clears the gate on drop, so a refresh future that is cancelled mid-flight
/// does not wedge the explorer.
#[derive(Debug)]
pub struct RefreshGuard(Arc<AtomicBool>);

impl RefreshGate {
    pub fn try_begin(&self) -> Option<RefreshGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard(self.0.clone()))
    }

    pub fn is_refreshing(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the resource tree and the open tabs, and drives them from refreshes,
/// routes and expansion toggles.
pub struct Explorer {
    engine: ResourceSyncEngine,
    resolver: TabRouteResolver,
    tree: ResourceTree,
    tabs: TabRegistry,
    notifier: Arc<dyn ChangeNotifier>,
    account_ready: bool,
    refreshing: RefreshGate,
    pending_route: Option<Route>,
}

impl fmt::Debug for Explorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explorer")
            .field("engine", &self.engine)
            .field("tree", &self.tree)
            .field("tabs", &self.tabs)
            .field("account_ready", &self.account_ready)
            .field("refreshing", &self.refreshing)
            .field("pending_route", &self.pending_route)
            .finish()
    }
}

impl Explorer {
    pub fn new(
        repository: Arc<dyn Repository>,
        config: &schema::Tree,
        hooks: Arc<dyn TabHooks>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            engine: ResourceSyncEngine::new(repository, config.auto_expand_ceiling),
            resolver: TabRouteResolver::new(notifier.clone()),
            tree: ResourceTree::new(),
            tabs: TabRegistry::new(hooks, notifier.clone()),
            notifier,
            account_ready: false,
            refreshing: RefreshGate::default(),
            pending_route: None,
        }
    }

    pub fn tree(&self) -> &ResourceTree {
        &self.tree
    }

    pub fn tabs(&self) -> &TabRegistry {
        &self.tabs
    }

    /// For user-driven tab actions (clicks, closing, saving a new item)
    pub fn tabs_mut(&mut self) -> &mut TabRegistry {
        &mut self.tabs
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.active_tab()
    }

    pub fn pending_route(&self) -> Option<&Route> {
        self.pending_route.as_ref()
    }

    pub fn set_account_ready(&mut self, ready: bool) {
        self.account_ready = ready;
    }

    pub fn is_account_ready(&self) -> bool {
        self.account_ready
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.is_refreshing()
    }

    /// A handle on the refresh flag that outlives borrows of the explorer
    pub fn refresh_gate(&self) -> RefreshGate {
        self.refreshing.clone()
    }

    /// Routes are only resolved against a settled tree of a ready account
    pub fn is_ready(&self) -> bool {
        self.account_ready && !self.is_refreshing()
    }

    /// Re-list every level of the tree that is loaded, then replay a route
    /// that arrived while the explorer was not ready.
    pub async fn refresh_all_databases(&mut self) -> ExplorerResult<RefreshSummary> {
        let guard = self
            .refreshing
            .try_begin()
            .ok_or(ExplorerError::RefreshInProgress)?;

        info!("Refreshing databases");
        let plan = match self.engine.plan_refresh(&self.tree).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!("Error refreshing databases, keeping the current tree: {e}");
                return Err(e.into());
            }
        };

        let summary = self.tree.apply_plan(plan);
        if !summary.is_unchanged() {
            self.notifier.tree_changed();
        }
        self.tabs.close_tabs_for_missing_resources(&self.tree);
        drop(guard);

        info!(
            "Refreshed databases: {} added, {} removed, {} renamed; {} collections added, {} removed",
            summary.databases_added,
            summary.databases_removed,
            summary.databases_renamed,
            summary.collections_added,
            summary.collections_removed,
        );

        if let Some(route) = self.pending_route.take() {
            debug!("Replaying deferred route {route:?}");
            if let Err(e) = self.open_route(route).await {
                warn!("Error opening deferred route: {e}");
            }
        }

        Ok(summary)
    }

    /// Resolve a route and apply the outcome to the open tabs.
    ///
    /// While the explorer is not ready the route is kept (replacing any
    /// earlier one) until the next refresh completes.
    pub async fn open_route(&mut self, route: Route) -> ExplorerResult<Action> {
        if !self.is_ready() {
            debug!("Deferring {route:?} until the explorer is ready");
            self.pending_route = Some(route);
            return Ok(Action::NoOp);
        }

        if route.needs_collection_children() {
            if let (Some(database_id), Some(collection_id)) =
                (route.database_id.as_deref(), route.collection_id.as_deref())
            {
                let unloaded = self
                    .tree
                    .collection(database_id, collection_id)
                    .map(|collection| !collection.children_loaded)
                    .unwrap_or(false);
                if unloaded {
                    self.load_collection(database_id, collection_id).await?;
                }
            }
        }

        let ready = self.is_ready();
        let action = self
            .resolver
            .resolve(&mut self.tree, &self.tabs, &route, ready);
        match &action {
            Action::ActivateExisting(id) => self.tabs.activate(*id)?,
            Action::CreateAndActivate(spec) => {
                self.tabs.activate_new(Tab::new(spec.clone()))?;
            }
            Action::NoOp => debug!("Nothing to open for {route:?}"),
        }
        Ok(action)
    }

    /// Parse a location hash and open it; unrecognized hashes are no-ops.
    pub async fn open_hash(&mut self, hash: &str) -> ExplorerResult<Action> {
        match parse_hash(hash) {
            Some(route) => self.open_route(route).await,
            None => {
                debug!("Unrecognized route {hash:?}");
                Ok(Action::NoOp)
            }
        }
    }

    pub async fn expand_database(&mut self, database_id: &str) -> ExplorerResult<()> {
        let loaded = self
            .tree
            .database(database_id)
            .map(|database| database.collections_loaded)
            .ok_or_else(|| SyncError::DatabaseDoesNotExist {
                name: database_id.to_string(),
            })?;
        if !loaded {
            self.load_database(database_id).await?;
        }

        if self.tree.set_database_expanded(database_id, true) {
            self.notifier.tree_changed();
        }
        Ok(())
    }

    pub fn collapse_database(&mut self, database_id: &str) -> bool {
        let changed = self.tree.set_database_expanded(database_id, false);
        if changed {
            self.notifier.tree_changed();
        }
        changed
    }

    pub async fn expand_collection(
        &mut self,
        database_id: &str,
        collection_id: &str,
    ) -> ExplorerResult<()> {
        self.load_collection(database_id, collection_id).await?;
        if self
            .tree
            .set_collection_expanded(database_id, collection_id, true)
        {
            self.notifier.tree_changed();
        }
        Ok(())
    }

    pub fn collapse_collection(&mut self, database_id: &str, collection_id: &str) -> bool {
        let changed = self
            .tree
            .set_collection_expanded(database_id, collection_id, false);
        if changed {
            self.notifier.tree_changed();
        }
        changed
    }

    /// Re-list the collections of one database. The tree is untouched if
    /// the listing fails.
    pub async fn load_database(&mut self, database_id: &str) -> ExplorerResult<()> {
        let (rid, delta) = self.engine.plan_database(&self.tree, database_id).await?;
        debug!(
            "Loaded {} collection change(s) for database {database_id}",
            delta.change_count()
        );
        self.tree.apply_collections(&rid, delta);
        self.notifier.tree_changed();
        Ok(())
    }

    /// Re-list the stored procedures, triggers and UDFs of one collection.
    pub async fn load_collection(
        &mut self,
        database_id: &str,
        collection_id: &str,
    ) -> ExplorerResult<()> {
        let (database, collection, delta) = self
            .engine
            .plan_collection(&self.tree, database_id, collection_id)
            .await?;
        debug!(
            "Loaded {} script change(s) for {collection} in {database}",
            delta.change_count()
        );
        self.tree.apply_scripts(&database.rid, &collection.rid, delta);
        self.notifier.tree_changed();
        Ok(())
    }
}
