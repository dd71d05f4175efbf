use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::explorer::Explorer;
use crate::notify::{ChangeNotifier, TabHooks};
use crate::repository::interface::{Repository, Result};
use crate::repository::memory::InMemoryRepository;

use super::schema;

pub fn build_repository(cfg: &schema::ExplorerConfig) -> Result<Arc<dyn Repository>> {
    let repository: Arc<dyn Repository> = match &cfg.source {
        schema::Source::Snapshot(schema::SnapshotSource { path }) => {
            info!("Serving resources from snapshot {path}");
            Arc::new(InMemoryRepository::from_path(Path::new(path))?)
        }
        schema::Source::InMemory(_) => Arc::new(InMemoryRepository::default()),
    };
    Ok(repository)
}

pub fn build_explorer(
    cfg: &schema::ExplorerConfig,
    hooks: Arc<dyn TabHooks>,
    notifier: Arc<dyn ChangeNotifier>,
) -> Result<Explorer> {
    let repository = build_repository(cfg)?;
    Ok(Explorer::new(repository, &cfg.tree, hooks, notifier))
}
