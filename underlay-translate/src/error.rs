use config_tree_core::{Key, PathError, TreePath};
use thiserror::Error;

use crate::codec::CodecError;
use crate::store::StoreError;

/// Failures raised while translating one canonical element.
///
/// Store failures carry the canonical path of the element being handled; the underlay
/// address is part of the wrapped [`StoreError`].
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("read failed at {path}: {source}")]
    ReadFailed {
        path: TreePath,
        #[source]
        source: StoreError,
    },

    #[error("write failed at {path}: {source}")]
    WriteFailed {
        path: TreePath,
        #[source]
        source: StoreError,
    },

    /// A pre-condition on canonical or underlay state does not hold. Raised before any
    /// underlay mutation.
    #[error("validation failed at {path}: {reason}")]
    ValidationFailed { path: TreePath, reason: String },

    #[error("no handler claims {path}")]
    UnsupportedElement { path: TreePath },

    #[error("key {key} under {path} is produced by more than one handler")]
    KeyCollision { path: TreePath, key: Key },

    /// The canonical path lacks a key the handler needs.
    #[error(transparent)]
    Path(#[from] PathError),
}

impl TranslateError {
    pub fn validation(path: &TreePath, reason: impl Into<String>) -> Self {
        TranslateError::ValidationFailed {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Canonical input that does not decode is a validation failure.
    pub fn invalid_input(path: &TreePath, err: CodecError) -> Self {
        Self::validation(path, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;

/// Attach canonical path context to store results.
pub trait StoreResultExt<T> {
    fn or_read_failed(self, path: &TreePath) -> Result<T>;
    fn or_write_failed(self, path: &TreePath) -> Result<T>;
}

impl<T> StoreResultExt<T> for std::result::Result<T, StoreError> {
    fn or_read_failed(self, path: &TreePath) -> Result<T> {
        self.map_err(|source| TranslateError::ReadFailed {
            path: path.clone(),
            source,
        })
    }

    fn or_write_failed(self, path: &TreePath) -> Result<T> {
        self.map_err(|source| TranslateError::WriteFailed {
            path: path.clone(),
            source,
        })
    }
}

/// Attach canonical path context to codec results.
pub trait CodecResultExt<T> {
    fn or_invalid(self, path: &TreePath) -> Result<T>;
}

impl<T> CodecResultExt<T> for std::result::Result<T, CodecError> {
    fn or_invalid(self, path: &TreePath) -> Result<T> {
        self.map_err(|err| TranslateError::invalid_input(path, err))
    }
}
