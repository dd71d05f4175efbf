use std::collections::{HashMap, HashSet};

use tracing::error;

use crate::data_types::ResourceRid;
use crate::tree::NodeRef;

/// A node of the resource tree, identified by its rid
pub trait ResourceNode {
    fn rid(&self) -> &str;
    fn id(&self) -> &str;
    fn rename(&mut self, id: String);
    fn set_expanded(&mut self, _expanded: bool) {}
}

/// A raw listing entry as returned by the fetch collaborator
pub trait ResourceRecord {
    fn rid(&self) -> &str;
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub rid: ResourceRid,
    pub from: String,
    pub to: String,
}

/// The outcome of one reconcile pass over a list of siblings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta<N> {
    pub to_add: Vec<N>,
    pub to_remove: Vec<NodeRef>,
    pub to_rename: Vec<Rename>,
}

impl<N> Default for Delta<N> {
    fn default() -> Self {
        Self {
            to_add: vec![],
            to_remove: vec![],
            to_rename: vec![],
        }
    }
}

impl<N> Delta<N> {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty() && self.to_rename.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.to_add.len() + self.to_remove.len() + self.to_rename.len()
    }
}

/// Diff `current` against the authoritative `fetched` listing, keyed by rid.
///
/// New records are turned into nodes with `build`. When a ceiling is given and
/// the sibling count after the merge is at or below it, the new nodes are
/// marked expanded. Nodes present on both sides are left alone apart from an
/// id rename; their children are reconciled separately.
pub fn reconcile<N, R, F>(
    current: &[N],
    fetched: Vec<R>,
    auto_expand_ceiling: Option<usize>,
    mut build: F,
) -> Delta<N>
where
    N: ResourceNode,
    R: ResourceRecord,
    F: FnMut(R) -> N,
{
    let current_by_rid: HashMap<&str, &N> =
        current.iter().map(|node| (node.rid(), node)).collect();
    debug_assert_eq!(
        current_by_rid.len(),
        current.len(),
        "Duplicate rid among current nodes"
    );

    let mut seen: HashSet<String> = HashSet::with_capacity(fetched.len());
    let mut delta = Delta::default();

    for record in fetched {
        if !seen.insert(record.rid().to_string()) {
            debug_assert!(false, "Duplicate rid {} in fetched listing", record.rid());
            error!(
                "Ignoring duplicate rid {} ({}) in fetched listing",
                record.rid(),
                record.id()
            );
            continue;
        }

        match current_by_rid.get(record.rid()) {
            Some(node) if node.id() != record.id() => delta.to_rename.push(Rename {
                rid: record.rid().to_string(),
                from: node.id().to_string(),
                to: record.id().to_string(),
            }),
            Some(_) => {}
            None => delta.to_add.push(build(record)),
        }
    }

    delta.to_remove = current
        .iter()
        .filter(|node| !seen.contains(node.rid()))
        .map(NodeRef::of)
        .collect();

    let merged_count = current.len() - delta.to_remove.len() + delta.to_add.len();
    if matches!(auto_expand_ceiling, Some(ceiling) if merged_count <= ceiling) {
        for node in delta.to_add.iter_mut() {
            node.set_expanded(true);
        }
    }

    delta
}

/// Merge a delta into `nodes`, keeping the case-insensitive id order.
pub fn apply<N: ResourceNode>(nodes: &mut Vec<N>, delta: Delta<N>) {
    let Delta {
        to_add,
        to_remove,
        to_rename,
    } = delta;

    if !to_remove.is_empty() {
        let removed: HashSet<ResourceRid> =
            to_remove.into_iter().map(|node| node.rid).collect();
        nodes.retain(|node| !removed.contains(node.rid()));
    }

    for rename in to_rename {
        if let Some(node) = nodes.iter_mut().find(|node| node.rid() == rename.rid) {
            node.rename(rename.to);
        }
    }

    nodes.extend(to_add);
    sort_nodes(nodes);

    debug_assert_eq!(
        nodes.iter().map(|node| node.rid()).collect::<HashSet<_>>().len(),
        nodes.len(),
        "Duplicate rid after merge"
    );
}

/// Ascending case-insensitive id order; ties fall back to the exact id and
/// then the rid so that the order is total.
pub fn sort_nodes<N: ResourceNode>(nodes: &mut [N]) {
    nodes.sort_by_cached_key(|node| {
        (
            node.id().to_lowercase(),
            node.id().to_string(),
            node.rid().to_string(),
        )
    });
}
