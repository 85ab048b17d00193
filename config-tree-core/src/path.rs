//! Typed hierarchical addressing.
//!
//! A [`TreePath`] is an ordered list of [`Step`]s. Container steps carry no key; list-entry
//! steps carry a [`Key`] made of one or more `(leaf, value)` pairs, so composite list keys are
//! first-class. The text form is `/a/b[k=v]/c[k1=v1][k2=v2]`; values containing `/`, `[`, `]`,
//! `=` or a quote are written quoted.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::tree::ConfigNode;

/// Errors raised by path construction, parsing, and key extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path does not contain a keyed step for the requested list node.
    #[error("no keyed `{node}` step in path {path}")]
    NotFound { path: String, node: String },
    /// Textual path could not be parsed.
    #[error("invalid path `{input}`: {reason}")]
    Syntax { input: String, reason: String },
}

/// Identity of a list entry: ordered `(leaf, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(Vec<(String, String)>);

impl Key {
    /// Single-leaf key.
    pub fn single(leaf: impl Into<String>, value: impl Into<String>) -> Self {
        Self(vec![(leaf.into(), value.into())])
    }

    /// Builder-style append of another key leaf.
    pub fn with(mut self, leaf: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((leaf.into(), value.into()));
        self
    }

    /// Value of one key leaf.
    pub fn get(&self, leaf: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == leaf)
            .map(|(_, value)| value.as_str())
    }

    /// Value of the first key leaf; the whole identity for single-leaf keys.
    pub fn first_value(&self) -> Option<&str> {
        self.0.first().map(|(_, value)| value.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every key leaf of `node` carries the expected value.
    pub fn matches(&self, node: &ConfigNode) -> bool {
        self.0
            .iter()
            .all(|(leaf, value)| node.leaf_text(leaf) == Some(value.as_str()))
    }

    /// Build the key of `node` from the named key leaves, if all are present.
    pub fn from_node(node: &ConfigNode, leaves: &[String]) -> Option<Self> {
        let mut key = Key::default();
        for leaf in leaves {
            key = key.with(leaf.as_str(), node.leaf_text(leaf)?);
        }
        Some(key)
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (leaf, value) in &self.0 {
            write!(f, "[{leaf}={}]", quote_if_needed(value))?;
        }
        Ok(())
    }
}

/// One addressing step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Step {
    pub node: String,
    pub key: Option<Key>,
}

impl Step {
    pub fn container(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            key: None,
        }
    }

    pub fn entry(node: impl Into<String>, key: Key) -> Self {
        Self {
            node: node.into(),
            key: Some(key),
        }
    }

    /// True when `node` is the element this step addresses among its siblings.
    pub fn matches(&self, node: &ConfigNode) -> bool {
        node.tag == self.node && self.key.as_ref().map_or(true, |key| key.matches(node))
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node)?;
        if let Some(key) = &self.key {
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// Absolute address of one node in a configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TreePath {
    steps: Vec<Step>,
}

impl TreePath {
    /// The empty path, addressing the tree root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// Path to a container child.
    pub fn child(&self, node: impl Into<String>) -> Self {
        let mut steps = self.steps.clone();
        steps.push(Step::container(node));
        Self { steps }
    }

    /// Path to a keyed list entry.
    pub fn child_keyed(&self, node: impl Into<String>, key: Key) -> Self {
        let mut steps = self.steps.clone();
        steps.push(Step::entry(node, key));
        Self { steps }
    }

    /// Append several container steps at once.
    pub fn join(&self, nodes: &[&str]) -> Self {
        let mut steps = self.steps.clone();
        steps.extend(nodes.iter().map(|node| Step::container(*node)));
        Self { steps }
    }

    /// Drop the last step. The parent of the root is the root.
    pub fn parent(&self) -> Self {
        let mut steps = self.steps.clone();
        steps.pop();
        Self { steps }
    }

    /// Key of the nearest step named `node`.
    pub fn key_of(&self, node: &str) -> Result<&Key, PathError> {
        self.steps
            .iter()
            .rev()
            .find(|step| step.node == node)
            .and_then(|step| step.key.as_ref())
            .ok_or_else(|| PathError::NotFound {
                path: self.to_string(),
                node: node.to_string(),
            })
    }

    /// Single key leaf value of the nearest step named `node`.
    pub fn key_value(&self, node: &str, leaf: &str) -> Result<&str, PathError> {
        self.key_of(node)?
            .get(leaf)
            .ok_or_else(|| PathError::NotFound {
                path: self.to_string(),
                node: format!("{node}[{leaf}]"),
            })
    }

    /// True when the path has a step named `node`.
    pub fn contains(&self, node: &str) -> bool {
        self.steps.iter().any(|step| step.node == node)
    }

    /// Truncate after the first step named `node`.
    pub fn cut(&self, node: &str) -> Option<Self> {
        let idx = self.steps.iter().position(|step| step.node == node)?;
        Some(Self {
            steps: self.steps[..=idx].to_vec(),
        })
    }

    pub fn is_prefix_of(&self, other: &TreePath) -> bool {
        self.steps.len() <= other.steps.len()
            && self.steps.iter().zip(&other.steps).all(|(a, b)| a == b)
    }
}

impl Display for TreePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "/");
        }
        for step in &self.steps {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

// Paths serialize in their text form.
impl Serialize for TreePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for TreePath {
    type Err = PathError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let syntax = |reason: &str| PathError::Syntax {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let rest = trimmed
            .strip_prefix('/')
            .ok_or_else(|| syntax("path must start with '/'"))?;

        let mut steps = Vec::new();
        let mut chars = rest.chars().peekable();
        while chars.peek().is_some() {
            let mut node = String::new();
            while let Some(&c) = chars.peek() {
                if c == '/' || c == '[' {
                    break;
                }
                node.push(c);
                chars.next();
            }
            if node.is_empty() {
                return Err(syntax("empty step name"));
            }

            let mut key = Key::default();
            while chars.peek() == Some(&'[') {
                chars.next();
                let mut leaf = String::new();
                loop {
                    match chars.next() {
                        Some('=') => break,
                        Some(']') | None => return Err(syntax("key predicate without '='")),
                        Some(c) => leaf.push(c),
                    }
                }
                let value = match chars.peek() {
                    Some(&quote) if quote == '\'' || quote == '"' => {
                        chars.next();
                        let mut value = String::new();
                        loop {
                            match chars.next() {
                                Some(c) if c == quote => break,
                                Some(c) => value.push(c),
                                None => return Err(syntax("unterminated quoted key value")),
                            }
                        }
                        if chars.next() != Some(']') {
                            return Err(syntax("expected ']' after quoted key value"));
                        }
                        value
                    }
                    _ => {
                        let mut value = String::new();
                        loop {
                            match chars.next() {
                                Some(']') => break,
                                Some(c) => value.push(c),
                                None => return Err(syntax("unterminated key predicate")),
                            }
                        }
                        value
                    }
                };
                if leaf.trim().is_empty() {
                    return Err(syntax("empty key leaf name"));
                }
                key = key.with(leaf.trim(), value);
            }

            steps.push(if key.is_empty() {
                Step::container(node)
            } else {
                Step::entry(node, key)
            });

            match chars.next() {
                Some('/') | None => {}
                Some(_) => return Err(syntax("unexpected character after key predicate")),
            }
        }

        Ok(TreePath { steps })
    }
}

fn quote_if_needed(value: &str) -> String {
    if !value.contains(['/', '[', ']', '=', '\'', '"']) {
        return value.to_string();
    }
    if value.contains('\'') {
        format!("\"{value}\"")
    } else {
        format!("'{value}'")
    }
}

#[cfg(test)]
mod tests {
    use super::{Key, PathError, TreePath};

    fn neighbor_path() -> TreePath {
        TreePath::root()
            .child("network-instances")
            .child_keyed("network-instance", Key::single("name", "default"))
            .child("protocols")
            .child_keyed(
                "protocol",
                Key::single("identifier", "BGP").with("name", "default"),
            )
            .join(&["bgp", "neighbors"])
            .child_keyed("neighbor", Key::single("neighbor-address", "10.1.0.4"))
    }

    #[test]
    fn key_of_finds_nearest_keyed_step() {
        let path = neighbor_path();
        let key = path.key_of("protocol").expect("protocol key");
        assert_eq!(key.get("identifier"), Some("BGP"));
        assert_eq!(key.get("name"), Some("default"));
        assert_eq!(
            path.key_value("neighbor", "neighbor-address"),
            Ok("10.1.0.4")
        );
    }

    #[test]
    fn key_of_reports_missing_list() {
        let err = neighbor_path().key_of("group").expect_err("missing");
        assert!(matches!(err, PathError::NotFound { node, .. } if node == "group"));
        let err = neighbor_path().key_of("bgp").expect_err("container");
        assert!(matches!(err, PathError::NotFound { .. }));
    }

    #[test]
    fn parent_and_cut_truncate() {
        let path = neighbor_path();
        assert_eq!(path.parent().last().map(|s| s.node.as_str()), Some("neighbors"));
        let bgp = path.cut("bgp").expect("bgp step");
        assert_eq!(bgp.len(), 5);
        assert!(bgp.is_prefix_of(&path));
        assert!(!path.is_prefix_of(&bgp));
        assert_eq!(TreePath::root().parent(), TreePath::root());
    }

    #[test]
    fn text_form_round_trips_with_quoted_values() {
        let raw = "/network-instances/network-instance[name=default]/local-aggregates/aggregate[prefix='10.0.0.0/8']";
        let path: TreePath = raw.parse().expect("parse");
        assert_eq!(path.len(), 4);
        assert_eq!(path.key_value("aggregate", "prefix"), Ok("10.0.0.0/8"));
        assert_eq!(path.to_string(), raw);
    }

    #[test]
    fn parses_composite_keys() {
        let path: TreePath = "/sourced-networks/sourced-network[network-addr=10.0.0.0][network-prefix=8]"
            .parse()
            .expect("parse");
        let key = path.key_of("sourced-network").expect("key");
        assert_eq!(key.entries().len(), 2);
        assert_eq!(key.get("network-prefix"), Some("8"));
    }

    #[test]
    fn rejects_malformed_text() {
        assert!("relative/path".parse::<TreePath>().is_err());
        assert!("/a[k]".parse::<TreePath>().is_err());
        assert!("/a[k='unterminated]".parse::<TreePath>().is_err());
        assert!("//a".parse::<TreePath>().is_err());
    }

    #[test]
    fn root_displays_as_slash() {
        assert_eq!(TreePath::root().to_string(), "/");
        assert_eq!("/".parse::<TreePath>(), Ok(TreePath::root()));
    }
}
