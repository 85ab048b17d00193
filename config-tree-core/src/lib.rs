//! Generic hierarchical configuration trees.
//!
//! [`ConfigNode`] models one element of a device or vendor-neutral configuration; [`TreePath`]
//! addresses a node with keyed steps; [`merge_node`] applies a patch the way a configuration
//! datastore merges. XML is read and written with `quick-xml`.

pub mod merge;
pub mod parser;
pub mod path;
mod resolve;
pub mod tree;
pub mod writer;

pub use merge::{key_fields, merge_node, removed_paths, step_for, KeyFields, TreeError};
pub use parser::{parse, parse_file, parse_with, ParseError, ParseOptions};
pub use path::{Key, PathError, Step, TreePath};
pub use tree::ConfigNode;
pub use writer::{write, write_file, write_with, WriteError, WriteOptions};
