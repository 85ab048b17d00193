use config_tree_core::{ConfigNode, TreePath};
use serde::Serialize;

use crate::error::{Result, StoreResultExt};
use crate::store::{Datastore, UnderlayAccess};

/// What a transaction does to one canonical element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

/// Before/after data of one canonical element.
///
/// `before == None` is a create, `after == None` a delete, both present an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub before: Option<ConfigNode>,
    pub after: Option<ConfigNode>,
}

impl ChangeSet {
    pub fn create(after: ConfigNode) -> Self {
        Self {
            before: None,
            after: Some(after),
        }
    }

    pub fn update(before: ConfigNode, after: ConfigNode) -> Self {
        Self {
            before: Some(before),
            after: Some(after),
        }
    }

    pub fn delete(before: ConfigNode) -> Self {
        Self {
            before: Some(before),
            after: None,
        }
    }

    /// Extract the element at `path` from two full canonical trees.
    pub fn between(path: &TreePath, before: &ConfigNode, after: &ConfigNode) -> Self {
        Self {
            before: before.find(path).cloned(),
            after: after.find(path).cloned(),
        }
    }

    /// `None` when neither side carries the element.
    pub fn kind(&self) -> Option<ChangeKind> {
        match (&self.before, &self.after) {
            (None, Some(_)) => Some(ChangeKind::Create),
            (Some(_), Some(_)) => Some(ChangeKind::Update),
            (Some(_), None) => Some(ChangeKind::Delete),
            (None, None) => None,
        }
    }

    /// True when both sides are present and identical.
    pub fn is_noop(&self) -> bool {
        matches!((&self.before, &self.after), (Some(b), Some(a)) if a == b)
    }
}

/// Per-request read scope.
#[derive(Clone, Copy)]
pub struct ReadContext<'a> {
    pub store: &'a dyn UnderlayAccess,
    pub datastore: Datastore,
}

impl<'a> ReadContext<'a> {
    pub fn new(store: &'a dyn UnderlayAccess, datastore: Datastore) -> Self {
        Self { store, datastore }
    }

    /// Read an underlay node on behalf of the canonical element at `canonical`.
    pub fn read(&self, canonical: &TreePath, underlay: &TreePath) -> Result<Option<ConfigNode>> {
        self.store
            .read(underlay, self.datastore)
            .or_read_failed(canonical)
    }
}

/// Per-transaction write scope: store handle plus read-through access to the full canonical
/// trees before and after the transaction.
#[derive(Clone, Copy)]
pub struct WriteContext<'a> {
    pub store: &'a dyn UnderlayAccess,
    before: &'a ConfigNode,
    after: &'a ConfigNode,
}

impl<'a> WriteContext<'a> {
    pub fn new(store: &'a dyn UnderlayAccess, before: &'a ConfigNode, after: &'a ConfigNode) -> Self {
        Self {
            store,
            before,
            after,
        }
    }

    pub fn read_before(&self, path: &TreePath) -> Option<&'a ConfigNode> {
        self.before.find(path)
    }

    pub fn read_after(&self, path: &TreePath) -> Option<&'a ConfigNode> {
        self.after.find(path)
    }

    /// Canonical state a check should look at: `before` for deletes, `after` otherwise.
    pub fn read_for(&self, path: &TreePath, is_delete: bool) -> Option<&'a ConfigNode> {
        if is_delete {
            self.read_before(path)
        } else {
            self.read_after(path)
        }
    }

    /// Read the underlay intended configuration.
    pub fn read_underlay(&self, canonical: &TreePath, underlay: &TreePath) -> Result<Option<ConfigNode>> {
        self.store
            .read(underlay, Datastore::Config)
            .or_read_failed(canonical)
    }
}
