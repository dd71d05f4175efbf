use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, error, info};

use crate::notify::{ChangeNotifier, NoopHooks, TabHooks};
use crate::tabs::{Tab, TabError, TabId, TabKey, TabKind, TabResult, TabState};
use crate::tree::ResourceTree;

/// The set of open tabs, in opening order, with at most one of them active.
pub struct TabRegistry {
    tabs: IndexMap<TabId, Tab>,
    active: Option<TabId>,
    hooks: Arc<dyn TabHooks>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl fmt::Debug for TabRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabRegistry")
            .field("tabs", &self.tabs)
            .field("active", &self.active)
            .finish()
    }
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::new(Arc::new(NoopHooks), Arc::new(NoopHooks))
    }
}

impl TabRegistry {
    pub fn new(hooks: Arc<dyn TabHooks>, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self {
            tabs: IndexMap::new(),
            active: None,
            hooks,
            notifier,
        }
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tabs(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.values()
    }

    /// Open tabs of `kind` matching `predicate`, in opening order
    pub fn get_tabs<P>(&self, kind: TabKind, predicate: P) -> Vec<&Tab>
    where
        P: Fn(&Tab) -> bool,
    {
        self.tabs
            .values()
            .filter(|tab| tab.kind() == kind && predicate(tab))
            .collect()
    }

    pub fn find(&self, id: TabId) -> Option<&Tab> {
        self.tabs.get(&id)
    }

    pub fn find_by_key(&self, key: &TabKey) -> Option<&Tab> {
        self.tabs.values().find(|tab| tab.key() == key)
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active.and_then(|id| self.tabs.get(&id))
    }

    pub fn activate(&mut self, id: TabId) -> TabResult<()> {
        if !self.tabs.contains_key(&id) {
            return Err(TabError::NotOpen { id });
        }
        if self.active == Some(id) {
            return Ok(());
        }

        if let Some(previous) = self.active.take() {
            if let Some(tab) = self.tabs.get_mut(&previous) {
                tab.state = TabState::Inactive;
                self.hooks.on_deactivate(tab);
            }
        }

        let tab = self
            .tabs
            .get_mut(&id)
            .ok_or(TabError::NotOpen { id })?;
        tab.state = TabState::Active;
        self.active = Some(id);
        self.hooks.on_activate(tab);

        self.debug_check_invariants();
        self.notifier.tabs_changed();
        Ok(())
    }

    /// Register a freshly built tab and make it the active one.
    pub fn activate_new(&mut self, tab: Tab) -> TabResult<TabId> {
        if let Some(existing) = self.find_by_key(tab.key()) {
            let existing = existing.id();
            debug_assert!(false, "A tab with key {} is already open", tab.key());
            error!(
                "Not opening a second tab with key {}, activating {existing} instead",
                tab.key()
            );
            self.activate(existing)?;
            return Ok(existing);
        }

        let id = tab.id();
        debug!("Opening tab {} ({})", tab.title(), tab.key());
        self.tabs.insert(id, tab);
        self.activate(id)?;
        Ok(id)
    }

    /// Remove every tab matching `predicate` and hand them back closed.
    pub fn close_tabs<P>(&mut self, predicate: P) -> Vec<Tab>
    where
        P: Fn(&Tab) -> bool,
    {
        let ids: Vec<TabId> = self
            .tabs
            .values()
            .filter(|tab| predicate(tab))
            .map(Tab::id)
            .collect();

        let mut closed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(mut tab) = self.tabs.shift_remove(&id) {
                if self.active == Some(id) {
                    self.active = None;
                    self.hooks.on_deactivate(&tab);
                }
                tab.state = TabState::Closed;
                closed.push(tab);
            }
        }

        if !closed.is_empty() {
            debug!("Closed {} tab(s)", closed.len());
            self.debug_check_invariants();
            self.notifier.tabs_changed();
        }
        closed
    }

    /// Bind an unsaved new-item tab to the sub-resource it was saved as, so
    /// later refreshes follow that item's renames and deletion.
    pub fn commit_new_item(
        &mut self,
        id: TabId,
        sub_resource_id: &str,
        sub_resource_rid: &str,
    ) -> TabResult<()> {
        let tab = self.tabs.get(&id).ok_or(TabError::NotOpen { id })?;
        if !tab.is_new() || !tab.kind().supports_new_item() {
            return Err(TabError::NotNewItem { id });
        }

        let key = TabKey {
            sub_resource_id: Some(sub_resource_id.to_string()),
            ..tab.key().clone()
        };
        if self.find_by_key(&key).is_some() {
            return Err(TabError::DuplicateKey { key });
        }

        let tab = self
            .tabs
            .get_mut(&id)
            .ok_or(TabError::NotOpen { id })?;
        tab.key = key;
        tab.title = sub_resource_id.to_string();
        tab.sub_resource_rid = Some(sub_resource_rid.to_string());
        tab.is_new = false;

        self.notifier.tabs_changed();
        Ok(())
    }

    /// Follow the tree after a refresh: tabs whose database, collection or
    /// sub-resource is gone are closed, tabs of renamed resources are re-keyed.
    pub fn close_tabs_for_missing_resources(&mut self, tree: &ResourceTree) -> Vec<Tab> {
        let closed = self.close_tabs(|tab| resolve_key(tree, tab).is_none());
        if !closed.is_empty() {
            info!(
                "Closed {} tab(s) of resources that no longer exist",
                closed.len()
            );
        }

        let mut renamed = 0;
        let ids: Vec<TabId> = self.tabs.keys().copied().collect();
        for id in ids {
            let Some(key) = self.tabs.get(&id).and_then(|tab| resolve_key(tree, tab)) else {
                continue;
            };
            if self.tabs.get(&id).map(|tab| tab.key() == &key).unwrap_or(true) {
                continue;
            }
            if self.find_by_key(&key).is_some() {
                error!("Not re-keying tab {id}: {key} is already open");
                continue;
            }
            if let Some(tab) = self.tabs.get_mut(&id) {
                debug!("Re-keying tab {} to {key}", tab.key());
                tab.key = key;
                renamed += 1;
            }
        }

        if renamed > 0 {
            self.notifier.tabs_changed();
        }
        closed
    }

    fn debug_check_invariants(&self) {
        if cfg!(debug_assertions) {
            let active = self.tabs.values().filter(|tab| tab.is_active()).count();
            assert!(active <= 1, "{active} tabs are active at once");
            assert_eq!(
                active == 1,
                self.active.is_some(),
                "Active tab pointer out of sync"
            );
        }
    }
}

/// The key `tab` should carry against `tree`, looking its resources up by
/// rid, or `None` when one of them no longer exists.
fn resolve_key(tree: &ResourceTree, tab: &Tab) -> Option<TabKey> {
    let database = tree.database_by_rid(tab.database_rid())?;
    let mut key = TabKey {
        database_id: database.id.clone(),
        ..tab.key().clone()
    };

    let Some(collection_rid) = tab.collection_rid() else {
        return Some(key);
    };
    // Collections of a database that was never listed are unknown, not gone
    if !database.collections_loaded {
        return Some(key);
    }
    let collection = database
        .collections
        .iter()
        .find(|collection| collection.rid == collection_rid)?;
    key.collection_id = Some(collection.id.clone());

    if let (Some(sub_rid), Some(kind)) =
        (tab.sub_resource_rid(), tab.kind().sub_resource_kind())
    {
        if collection.children_loaded {
            let sub = collection
                .sub_resources(kind)
                .iter()
                .find(|sub| sub.rid == sub_rid)?;
            key.sub_resource_id = Some(sub.id.clone());
        }
    }
    Some(key)
}
