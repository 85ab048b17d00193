//! Concrete entity mappings, one submodule per underlay family.

pub mod junos;
pub mod xr;

use config_tree_core::{ConfigNode, Key, TreePath};

use crate::canonical;
use crate::error::Result;
use crate::underlay::Scope;

/// Device settings the mappings need, taken from the loaded profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Underlay BGP instance; the canonical BGP protocol must carry this name.
    pub bgp_instance: String,
    /// Canonical name of the global routing table.
    pub default_instance: String,
    /// Export policy name rendered as `next-hop-self` instead of a route policy.
    pub nexthop_self_policy: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bgp_instance: "default".to_string(),
            default_instance: "default".to_string(),
            nexthop_self_policy: "nexthopself".to_string(),
        }
    }
}

impl Settings {
    /// Underlay scope of the network instance named in `path`.
    pub fn scope<'p>(&self, path: &'p TreePath) -> Result<Scope<'p>> {
        let ni = path.key_value(canonical::NETWORK_INSTANCE, canonical::NAME)?;
        Ok(Scope::of(ni, &self.default_instance))
    }
}

/// Canonical `protocol` entry with its key leaves and `config` copy.
pub(crate) fn protocol_node(key: &Key) -> ConfigNode {
    let config = key
        .entries()
        .iter()
        .fold(ConfigNode::new("config"), |config, (leaf, value)| {
            config.with_leaf(leaf.as_str(), value.as_str())
        });
    crate::handler::key_only_node(canonical::PROTOCOL, key).with_child(config)
}

/// Children of `node` below the container chain `path`.
pub(crate) fn children_at<'a>(node: &'a ConfigNode, path: &[&str], tag: &str) -> Vec<&'a ConfigNode> {
    node.descend(path)
        .map(|container| container.get_children(tag))
        .unwrap_or_default()
}
