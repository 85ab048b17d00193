//! Identity changes the underlay encodes in a node's address.
//!
//! When an update changes such an attribute (BGP group membership, the local AS number) the
//! node cannot be modified in place: it is deleted at the old address and created at the new
//! one. The two calls are not atomic; a failure between them leaves the element absent.

use config_tree_core::{merge_node, ConfigNode, TreePath};
use tracing::debug;

use crate::error::{Result, StoreResultExt};
use crate::store::{Datastore, StoreError, UnderlayAccess};
use crate::validate;

/// How the node is written at its new address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// `put`: the node is exclusively owned by the entity.
    Replace,
    /// `merge`: the container is shared with unmodeled siblings.
    Merge,
}

/// One delete-then-create move.
#[derive(Debug, Clone)]
pub struct Relocation {
    /// Parent subtree that must exist before anything is touched.
    pub anchor: Option<TreePath>,
    pub from: TreePath,
    pub to: TreePath,
    /// Attributes to write at `to`.
    pub node: ConfigNode,
    pub mode: WriteMode,
    /// Keep whatever else lived under `from` (children owned by other entities).
    pub carry_over: bool,
}

/// Move an underlay node on behalf of the canonical element at `canonical`.
///
/// Fails with `ValidationFailed` and no mutation when the anchor is missing.
pub fn relocate(store: &dyn UnderlayAccess, canonical: &TreePath, relocation: Relocation) -> Result<()> {
    let Relocation {
        anchor,
        from,
        to,
        node,
        mode,
        carry_over,
    } = relocation;

    if let Some(anchor) = &anchor {
        validate::underlay_exists(store, canonical, anchor)?;
    }

    let old = if carry_over {
        store.read(&from, Datastore::Config).or_read_failed(canonical)?
    } else {
        None
    };

    debug!(canonical = %canonical, from = %from, to = %to, "relocating underlay node");
    store.delete(&from).or_write_failed(canonical)?;

    let node = match old {
        Some(mut old) => {
            restamp(&mut old, &to);
            merge_node(&mut old, &node, store.key_fields())
                .map_err(StoreError::from)
                .or_write_failed(canonical)?;
            old
        }
        None => node,
    };

    match mode {
        WriteMode::Replace => store.put(&to, node),
        WriteMode::Merge => store.merge(&to, node),
    }
    .or_write_failed(canonical)
}

/// Rewrite the key leaves of `node` to those of the last step of `to`.
fn restamp(node: &mut ConfigNode, to: &TreePath) {
    if let Some(key) = to.last().and_then(|step| step.key.as_ref()) {
        for (leaf, value) in key.entries() {
            node.set_leaf(leaf, value.as_str());
        }
    }
}
