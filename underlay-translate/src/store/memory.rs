use std::sync::{Mutex, RwLock};

use config_tree_core::{merge_node, removed_paths, ConfigNode, KeyFields, Step, TreePath};
use serde::Serialize;
use tracing::debug;

use super::{Datastore, StoreError, StoreResult, UnderlayAccess};

/// Tag of the synthetic root node holding each datastore.
pub const ROOT_TAG: &str = "data";

/// Kind of a journaled store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreOp {
    Read,
    Put,
    Merge,
    Delete,
    SafeDelete,
    SafeMerge,
}

impl StoreOp {
    pub fn is_mutation(self) -> bool {
        !matches!(self, StoreOp::Read)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StoreOp::Read => "read",
            StoreOp::Put => "put",
            StoreOp::Merge => "merge",
            StoreOp::Delete => "delete",
            StoreOp::SafeDelete => "safe-delete",
            StoreOp::SafeMerge => "safe-merge",
        }
    }
}

/// One journaled call against the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreCall {
    pub op: StoreOp,
    pub path: TreePath,
    /// Payload of writes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<ConfigNode>,
}

/// In-memory underlay store.
///
/// Intended for tests and replay. Both datastores are held behind a `RwLock`; writes land
/// in the config datastore only. Every call, reads included, is appended to a journal.
pub struct MemoryStore {
    config: RwLock<ConfigNode>,
    operational: RwLock<ConfigNode>,
    key_fields: KeyFields,
    journal: Mutex<Vec<StoreCall>>,
    failing: Mutex<Vec<TreePath>>,
}

impl MemoryStore {
    /// Create an empty store for a schema with the given list keys.
    pub fn new(key_fields: KeyFields) -> Self {
        Self {
            config: RwLock::new(ConfigNode::new(ROOT_TAG)),
            operational: RwLock::new(ConfigNode::new(ROOT_TAG)),
            key_fields,
            journal: Mutex::new(Vec::new()),
            failing: Mutex::new(Vec::new()),
        }
    }

    /// Create a store whose datastores both start as `root`.
    pub fn seeded(root: ConfigNode, key_fields: KeyFields) -> Self {
        Self {
            config: RwLock::new(root.clone()),
            operational: RwLock::new(root),
            ..Self::new(key_fields)
        }
    }

    /// Replace the operational datastore.
    pub fn with_operational(self, root: ConfigNode) -> Self {
        Self {
            operational: RwLock::new(root),
            ..self
        }
    }

    /// Make every call at or below `prefix` fail with [`StoreError::Unavailable`].
    pub fn fail_at(&self, prefix: TreePath) -> StoreResult<()> {
        self.failing
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .push(prefix);
        Ok(())
    }

    /// Snapshot of one datastore.
    pub fn snapshot(&self, datastore: Datastore) -> StoreResult<ConfigNode> {
        let tree = self.tree(datastore).read().map_err(|_| StoreError::Poisoned)?;
        Ok(tree.clone())
    }

    /// Every call issued so far.
    pub fn calls(&self) -> StoreResult<Vec<StoreCall>> {
        Ok(self
            .journal
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .clone())
    }

    /// Issued calls that change the store.
    pub fn mutations(&self) -> StoreResult<Vec<StoreCall>> {
        Ok(self
            .calls()?
            .into_iter()
            .filter(|call| call.op.is_mutation())
            .collect())
    }

    /// Forget journaled calls, keeping the trees.
    pub fn clear_journal(&self) -> StoreResult<()> {
        self.journal
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .clear();
        Ok(())
    }

    fn tree(&self, datastore: Datastore) -> &RwLock<ConfigNode> {
        match datastore {
            Datastore::Config => &self.config,
            Datastore::Operational => &self.operational,
        }
    }

    fn record(&self, op: StoreOp, path: &TreePath, node: Option<&ConfigNode>) -> StoreResult<()> {
        if op.is_mutation() {
            debug!(op = op.as_str(), path = %path, "underlay mutation");
        }
        self.journal
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .push(StoreCall {
                op,
                path: path.clone(),
                node: node.cloned(),
            });

        let failing = self.failing.lock().map_err(|_| StoreError::Poisoned)?;
        if let Some(prefix) = failing.iter().find(|prefix| prefix.is_prefix_of(path)) {
            return Err(StoreError::Unavailable(format!(
                "{} rejected below {prefix}",
                op.as_str()
            )));
        }
        Ok(())
    }

    fn merge_locked(
        &self,
        root: &mut ConfigNode,
        path: &TreePath,
        mut node: ConfigNode,
    ) -> StoreResult<()> {
        let step = path.last().ok_or(StoreError::RootWrite)?;
        stamp_key(step, &mut node)?;
        let target = root.ensure_path(path);
        merge_node(target, &node, &self.key_fields)?;
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(KeyFields::new())
    }
}

impl UnderlayAccess for MemoryStore {
    fn read(&self, path: &TreePath, datastore: Datastore) -> StoreResult<Option<ConfigNode>> {
        self.record(StoreOp::Read, path, None)?;
        let tree = self.tree(datastore).read().map_err(|_| StoreError::Poisoned)?;
        Ok(tree.find(path).cloned())
    }

    fn put(&self, path: &TreePath, mut node: ConfigNode) -> StoreResult<()> {
        self.record(StoreOp::Put, path, Some(&node))?;
        let step = path.last().ok_or(StoreError::RootWrite)?;
        stamp_key(step, &mut node)?;

        let mut root = self.config.write().map_err(|_| StoreError::Poisoned)?;
        let parent = root.ensure_path(&path.parent());
        match parent.children.iter().position(|child| step.matches(child)) {
            Some(idx) => parent.children[idx] = node,
            None => parent.children.push(node),
        }
        Ok(())
    }

    fn merge(&self, path: &TreePath, node: ConfigNode) -> StoreResult<()> {
        self.record(StoreOp::Merge, path, Some(&node))?;
        let mut root = self.config.write().map_err(|_| StoreError::Poisoned)?;
        self.merge_locked(&mut root, path, node)
    }

    fn delete(&self, path: &TreePath) -> StoreResult<()> {
        self.record(StoreOp::Delete, path, None)?;
        if path.is_empty() {
            return Err(StoreError::RootWrite);
        }
        let mut root = self.config.write().map_err(|_| StoreError::Poisoned)?;
        match root.remove_at(path) {
            0 => Err(StoreError::Missing(path.to_string())),
            _ => Ok(()),
        }
    }

    fn key_fields(&self) -> &KeyFields {
        &self.key_fields
    }

    fn safe_delete(&self, path: &TreePath) -> StoreResult<()> {
        self.record(StoreOp::SafeDelete, path, None)?;
        if path.is_empty() {
            return Err(StoreError::RootWrite);
        }
        let mut root = self.config.write().map_err(|_| StoreError::Poisoned)?;
        root.remove_at(path);
        Ok(())
    }

    fn safe_merge(
        &self,
        path: &TreePath,
        before: Option<&ConfigNode>,
        after: ConfigNode,
    ) -> StoreResult<()> {
        self.record(StoreOp::SafeMerge, path, Some(&after))?;
        let mut root = self.config.write().map_err(|_| StoreError::Poisoned)?;
        if let Some(before) = before {
            for stale in removed_paths(path, before, &after, &self.key_fields) {
                root.remove_at(&stale);
            }
        }
        self.merge_locked(&mut root, path, after)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let calls = self.journal.lock().map(|j| j.len()).unwrap_or_default();
        f.debug_struct("MemoryStore")
            .field("key_fields", &self.key_fields.len())
            .field("journaled_calls", &calls)
            .finish()
    }
}

/// Make `node` carry the tag and key leaves of `step`.
fn stamp_key(step: &Step, node: &mut ConfigNode) -> StoreResult<()> {
    let tag = node.tag.clone();
    let mismatch = || StoreError::Mismatch {
        tag: tag.clone(),
        step: step.to_string(),
    };
    if node.tag != step.node {
        return Err(mismatch());
    }
    let Some(key) = &step.key else {
        return Ok(());
    };
    for (idx, (leaf, value)) in key.entries().iter().enumerate() {
        match node.leaf_text(leaf) {
            Some(existing) if existing == value => {}
            Some(_) => return Err(mismatch()),
            None => {
                let at = idx.min(node.children.len());
                node.children
                    .insert(at, ConfigNode::leaf(leaf.as_str(), value.as_str()));
            }
        }
    }
    Ok(())
}
