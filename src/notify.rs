use tracing::debug;

use crate::tabs::Tab;

/// Side-effect hooks fired by the tab registry around activation.
///
/// Deactivation lets the outgoing tab persist its UI state, activation lets
/// the host refresh command bars and menus for the incoming one.
pub trait TabHooks: Send + Sync {
    fn on_activate(&self, _tab: &Tab) {}

    fn on_deactivate(&self, _tab: &Tab) {}
}

/// Render-scheduling collaborator, told after every mutation of the resource
/// tree or of the open tabs.
pub trait ChangeNotifier: Send + Sync {
    fn tree_changed(&self) {}

    fn tabs_changed(&self) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl TabHooks for NoopHooks {}

impl ChangeNotifier for NoopHooks {}

/// Hooks and notifications that only log, for headless hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHooks;

impl TabHooks for TracingHooks {
    fn on_activate(&self, tab: &Tab) {
        debug!("Activated tab {} ({})", tab.title(), tab.key());
    }

    fn on_deactivate(&self, tab: &Tab) {
        debug!("Deactivated tab {} ({})", tab.title(), tab.key());
    }
}

impl ChangeNotifier for TracingHooks {
    fn tree_changed(&self) {
        debug!("Resource tree changed");
    }

    fn tabs_changed(&self) {
        debug!("Open tabs changed");
    }
}
