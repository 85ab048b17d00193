//! Reader and writer contracts of one canonical list.

use std::collections::HashSet;

use config_tree_core::{ConfigNode, Key, TreePath};
use tracing::debug;

use crate::context::{ChangeSet, ReadContext, WriteContext};
use crate::error::Result;

/// Reads one canonical list from the underlay.
///
/// - `enumerate` is a pure function of store state and yields each canonical key once,
///   first occurrence first.
/// - Every enumerated key is readable through `hydrate`.
/// - `hydrate` of an element absent from the underlay yields a node carrying only its key
///   leaves.
pub trait ListReader: Send + Sync {
    /// Canonical list node this reader produces, e.g. `neighbor`.
    fn list(&self) -> &'static str;

    /// Step names directly above the list node, e.g. `["bgp", "neighbors"]`. The registry
    /// routes a path to this handler only when its parent steps end with these names.
    fn location(&self) -> &'static [&'static str];

    fn enumerate(&self, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<Vec<Key>>;

    fn hydrate(&self, path: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode>;

    /// Insert a hydrated element into its list container.
    fn attach(&self, container: &mut ConfigNode, element: ConfigNode) {
        container.children.push(element);
    }
}

/// Writes one canonical list element to the underlay.
pub trait ElementWriter: Send + Sync {
    fn write(&self, path: &TreePath, after: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()>;

    /// Reconcile a changed element whose underlay address is unchanged.
    ///
    /// Defaults to writing `after` again, a merge over the existing node for every writer
    /// that merges, so underlay content the mapping does not own survives. Writers whose
    /// address depends on an attribute override this with a move.
    fn update(
        &self,
        path: &TreePath,
        _before: &ConfigNode,
        after: &ConfigNode,
        ctx: &WriteContext<'_>,
    ) -> Result<()> {
        self.write(path, after, ctx)
    }

    /// Remove the element addressed by `before`.
    fn delete(&self, path: &TreePath, before: &ConfigNode, ctx: &WriteContext<'_>) -> Result<()>;
}

/// Route one change to the matching writer operation. Unchanged elements are skipped.
pub fn apply_change(
    writer: &dyn ElementWriter,
    path: &TreePath,
    change: &ChangeSet,
    ctx: &WriteContext<'_>,
) -> Result<()> {
    match (&change.before, &change.after) {
        (None, Some(after)) => writer.write(path, after, ctx),
        (Some(before), Some(after)) if before == after => {
            debug!(path = %path, "element unchanged");
            Ok(())
        }
        (Some(before), Some(after)) => writer.update(path, before, after, ctx),
        (Some(before), None) => writer.delete(path, before, ctx),
        (None, None) => Ok(()),
    }
}

/// Enumerate, hydrate, and attach every element into a fresh list container named after the
/// last step of `parent`.
pub fn read_list(reader: &dyn ListReader, parent: &TreePath, ctx: &ReadContext<'_>) -> Result<ConfigNode> {
    let tag = parent.last().map_or("data", |step| step.node.as_str());
    let mut container = ConfigNode::new(tag);
    for key in reader.enumerate(parent, ctx)? {
        // An empty key stands for a singleton container.
        let path = if key.is_empty() {
            parent.child(reader.list())
        } else {
            parent.child_keyed(reader.list(), key)
        };
        let element = reader.hydrate(&path, ctx)?;
        reader.attach(&mut container, element);
    }
    Ok(container)
}

/// Drop repeated keys, keeping the first occurrence and the original order.
pub fn dedup_keys(keys: impl IntoIterator<Item = Key>) -> Vec<Key> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|key| seen.insert(key.clone())).collect()
}

/// Canonical list entry carrying only its key leaves.
pub fn key_only_node(list: &str, key: &Key) -> ConfigNode {
    key.entries()
        .iter()
        .fold(ConfigNode::new(list), |node, (leaf, value)| {
            node.with_leaf(leaf.as_str(), value.as_str())
        })
}
