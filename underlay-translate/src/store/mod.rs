//! Access to the remote hierarchical configuration store.
//!
//! The device session is owned by the host; this crate only sees the [`UnderlayAccess`]
//! contract. [`MemoryStore`] implements it over in-memory trees and journals every call.

mod error;
mod memory;

use std::fmt::{self, Display, Formatter};

use config_tree_core::{removed_paths, ConfigNode, KeyFields, TreePath};
use serde::Serialize;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, StoreCall, StoreOp};

/// Which view of the device configuration a read targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Datastore {
    /// Intended configuration.
    Config,
    /// Applied state as reported by the device.
    Operational,
}

impl Display for Datastore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Datastore::Config => write!(f, "config"),
            Datastore::Operational => write!(f, "operational"),
        }
    }
}

/// Transactional access to one device's underlay configuration.
///
/// Implementations must satisfy:
/// - `read` returns `Ok(None)` for absent nodes; only transport problems are errors.
/// - `put` replaces the addressed node, `merge` combines with it; both create missing
///   ancestors.
/// - `delete` fails when the node is absent; `safe_delete` tolerates absence.
/// - Calls are applied in the order they are issued.
pub trait UnderlayAccess: Send + Sync {
    fn read(&self, path: &TreePath, datastore: Datastore) -> StoreResult<Option<ConfigNode>>;

    fn put(&self, path: &TreePath, node: ConfigNode) -> StoreResult<()>;

    fn merge(&self, path: &TreePath, node: ConfigNode) -> StoreResult<()>;

    fn delete(&self, path: &TreePath) -> StoreResult<()>;

    /// List key leaves of the underlay schema, used to address list entries inside subtrees.
    fn key_fields(&self) -> &KeyFields;

    /// Delete `path` if it exists.
    fn safe_delete(&self, path: &TreePath) -> StoreResult<()> {
        match self.read(path, Datastore::Config)? {
            Some(_) => self.delete(path),
            None => Ok(()),
        }
    }

    /// Merge `after`, first removing what `before` carried and `after` no longer does.
    fn safe_merge(
        &self,
        path: &TreePath,
        before: Option<&ConfigNode>,
        after: ConfigNode,
    ) -> StoreResult<()> {
        if let Some(before) = before {
            for stale in removed_paths(path, before, &after, self.key_fields()) {
                self.safe_delete(&stale)?;
            }
        }
        self.merge(path, after)
    }
}
