use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// A node of a hierarchical configuration tree.
///
/// Containers and list entries carry children; leaves carry text. List entries are plain
/// children sharing a tag and are told apart by their key leaves (see [`crate::Key`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigNode {
    /// Element name.
    pub tag: String,
    /// Element attributes keyed by name (namespaces, operation markers).
    pub attributes: BTreeMap<String, String>,
    /// Child elements in document order.
    pub children: Vec<ConfigNode>,
    /// Leaf value, if any.
    pub text: Option<String>,
}

impl ConfigNode {
    /// Create an empty node.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Create a leaf node holding `text`.
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: ConfigNode) -> Self {
        self.children.push(child);
        self
    }

    /// Builder-style leaf append.
    pub fn with_leaf(self, tag: impl Into<String>, text: impl Into<String>) -> Self {
        self.with_child(ConfigNode::leaf(tag, text))
    }

    /// Append a leaf only when `value` is present.
    pub fn with_opt_leaf<T: ToString>(self, tag: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.with_leaf(tag, value.to_string()),
            None => self,
        }
    }

    /// True when the node has neither children nor text.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.is_none()
    }

    /// Return the first child with the provided tag.
    pub fn get_child(&self, tag: &str) -> Option<&ConfigNode> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Mutable variant of [`ConfigNode::get_child`].
    pub fn get_child_mut(&mut self, tag: &str) -> Option<&mut ConfigNode> {
        self.children.iter_mut().find(|child| child.tag == tag)
    }

    /// Return all children with the provided tag.
    pub fn get_children(&self, tag: &str) -> Vec<&ConfigNode> {
        self.children
            .iter()
            .filter(|child| child.tag == tag)
            .collect()
    }

    /// Walk a nested child path and return terminal node text if found.
    pub fn get_text<'a>(&'a self, path: &[&str]) -> Option<&'a str> {
        self.descend(path)?.text.as_deref()
    }

    /// Walk a nested child path by tag.
    pub fn descend<'a>(&'a self, path: &[&str]) -> Option<&'a ConfigNode> {
        let mut current = self;
        for segment in path {
            current = current.get_child(segment)?;
        }
        Some(current)
    }

    /// Trimmed, non-empty leaf text of a direct child.
    pub fn leaf_text(&self, tag: &str) -> Option<&str> {
        self.get_child(tag)
            .and_then(|c| c.text.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Set (or insert) a direct leaf child.
    pub fn set_leaf(&mut self, tag: &str, text: impl Into<String>) {
        let text = text.into();
        match self.get_child_mut(tag) {
            Some(existing) => {
                existing.children.clear();
                existing.text = Some(text);
            }
            None => self.children.push(ConfigNode::leaf(tag, text)),
        }
    }

    /// Replace the first child sharing `child`'s tag, or append it.
    pub fn upsert_child(&mut self, child: ConfigNode) {
        match self.children.iter().position(|c| c.tag == child.tag) {
            Some(idx) => self.children[idx] = child,
            None => self.children.push(child),
        }
    }

    /// Remove every direct child with `tag`; returns how many were dropped.
    pub fn remove_children(&mut self, tag: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|c| c.tag != tag);
        before - self.children.len()
    }
}

impl Display for ConfigNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (key, value) in &self.attributes {
            write!(f, " {key}=\"{value}\"")?;
        }
        if self.is_empty() {
            return write!(f, "/>");
        }
        write!(f, ">")?;
        if let Some(text) = &self.text {
            write!(f, "{text}")?;
        }
        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.tag)
    }
}
