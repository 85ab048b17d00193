//! Structural merge of configuration subtrees.
//!
//! Children of a patch are matched to existing siblings: list entries by their key leaves,
//! leaf-list entries by value, everything else by tag. Matched leaves are replaced, matched
//! containers recurse, unmatched nodes are appended, and siblings the patch does not mention
//! survive.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::path::{Key, Step, TreePath};
use crate::tree::ConfigNode;

/// Map from list tag to the names of its key leaves.
///
/// An empty leaf list marks a leaf-list whose entries are identified by their text.
pub type KeyFields = BTreeMap<String, Vec<String>>;

/// Errors raised by tree-level operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Merge target and patch are different elements.
    #[error("cannot merge <{patch}> into <{target}>")]
    TagMismatch { target: String, patch: String },
}

/// Build a [`KeyFields`] map from `(tag, "leaf leaf ...")` pairs.
pub fn key_fields(entries: &[(&str, &str)]) -> KeyFields {
    entries
        .iter()
        .map(|(tag, leaves)| {
            (
                (*tag).to_string(),
                leaves.split_whitespace().map(str::to_string).collect(),
            )
        })
        .collect()
}

/// Merge `patch` into `target`. Both must share the same tag.
pub fn merge_node(
    target: &mut ConfigNode,
    patch: &ConfigNode,
    key_fields: &KeyFields,
) -> Result<(), TreeError> {
    if target.tag != patch.tag {
        return Err(TreeError::TagMismatch {
            target: target.tag.clone(),
            patch: patch.tag.clone(),
        });
    }
    merge_into(target, patch, key_fields);
    Ok(())
}

fn merge_into(target: &mut ConfigNode, patch: &ConfigNode, key_fields: &KeyFields) {
    target
        .attributes
        .extend(patch.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
    if patch.text.is_some() {
        target.text = patch.text.clone();
    }
    for child in &patch.children {
        match counterpart(&target.children, child, key_fields) {
            Some(idx) => merge_into(&mut target.children[idx], child, key_fields),
            None => target.children.push(child.clone()),
        }
    }
}

fn counterpart(siblings: &[ConfigNode], node: &ConfigNode, key_fields: &KeyFields) -> Option<usize> {
    match key_fields.get(&node.tag) {
        Some(leaves) if leaves.is_empty() => siblings
            .iter()
            .position(|s| s.tag == node.tag && s.text == node.text),
        Some(leaves) => {
            let key = Key::from_node(node, leaves)?;
            siblings
                .iter()
                .position(|s| s.tag == node.tag && key.matches(s))
        }
        None => siblings.iter().position(|s| s.tag == node.tag),
    }
}

/// Addressing step for `node` among its siblings.
pub fn step_for(node: &ConfigNode, key_fields: &KeyFields) -> Step {
    match key_fields.get(&node.tag) {
        Some(leaves) if !leaves.is_empty() => match Key::from_node(node, leaves) {
            Some(key) => Step::entry(node.tag.as_str(), key),
            None => Step::container(node.tag.as_str()),
        },
        _ => Step::container(node.tag.as_str()),
    }
}

/// Paths (below `base`) of nodes present in `before` but dropped from `after`.
///
/// A dropped leaf-list entry yields the unkeyed leaf-list path; callers re-merge `after`
/// to restore the surviving entries.
pub fn removed_paths(
    base: &TreePath,
    before: &ConfigNode,
    after: &ConfigNode,
    key_fields: &KeyFields,
) -> Vec<TreePath> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    collect_removed(base, before, after, key_fields, &mut out, &mut seen);
    out
}

fn collect_removed(
    base: &TreePath,
    before: &ConfigNode,
    after: &ConfigNode,
    key_fields: &KeyFields,
    out: &mut Vec<TreePath>,
    seen: &mut HashSet<TreePath>,
) {
    for child in &before.children {
        let step = step_for(child, key_fields);
        let mut steps = base.steps().to_vec();
        steps.push(step);
        let path = TreePath::from_steps(steps);

        match counterpart(&after.children, child, key_fields) {
            None => {
                if seen.insert(path.clone()) {
                    out.push(path);
                }
            }
            Some(idx) => {
                let kept = &after.children[idx];
                if !child.children.is_empty() {
                    collect_removed(&path, child, kept, key_fields, out, seen);
                }
            }
        }
    }
}
