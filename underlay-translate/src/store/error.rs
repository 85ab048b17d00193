use config_tree_core::TreeError;

/// Errors from underlay store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A strict delete addressed a node that does not exist.
    #[error("no node at {0}")]
    Missing(String),

    /// The written node does not fit the addressed step (wrong tag or key leaves).
    #[error("node <{tag}> does not fit path step `{step}`")]
    Mismatch { tag: String, step: String },

    /// Writes must address a node below the datastore root.
    #[error("cannot replace the datastore root")]
    RootWrite,

    /// Structural merge failed.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Device session or transport failure reported by the backend.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
