//! Vendor-neutral (OpenConfig-shaped) model: path builders and typed views.
//!
//! Canonical data crosses the engine boundary as [`ConfigNode`] trees. Mappings parse the
//! element they handle into one of the typed structs here, and readers render back through
//! the same structs, so both directions agree on which fields are owned.
//!
//! [`ConfigNode`]: config_tree_core::ConfigNode

mod bgp;
mod ospf;
mod policy;
mod static_route;

use std::sync::LazyLock;

use config_tree_core::{ConfigNode, Key, TreePath};

pub use bgp::{afi_safi_node, Aggregate, BgpGlobal, Neighbor, PeerGroup, PeerGroupAf, PeerType};
pub use ospf::{Area, AreaInterface, MaxMetric, MaxMetricInclude};
pub use policy::{route_target_scope, ExtCommunitySet, RouteTargetDirection};
pub use static_route::{NextHop, StaticRoute};

use crate::codec::CodecError;

pub const NETWORK_INSTANCE: &str = "network-instance";
pub const PROTOCOL: &str = "protocol";
pub const IDENTIFIER: &str = "identifier";
pub const NAME: &str = "name";

pub const BGP: &str = "BGP";
pub const OSPF: &str = "OSPF";
pub const STATIC: &str = "STATIC";

pub static NETWORK_INSTANCES: LazyLock<TreePath> =
    LazyLock::new(|| TreePath::root().child("network-instances"));

pub static EXT_COMMUNITY_SETS: LazyLock<TreePath> = LazyLock::new(|| {
    TreePath::root().join(&[
        "routing-policy",
        "defined-sets",
        "bgp-defined-sets",
        "ext-community-sets",
    ])
});

/// Kind of a network instance, from its `config/type` leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceType {
    Default,
    Vrf,
}

impl InstanceType {
    pub fn from_canonical(value: &str) -> Option<Self> {
        match value.trim().rsplit(':').next().unwrap_or_default() {
            "DEFAULT_INSTANCE" => Some(InstanceType::Default),
            "L3VRF" => Some(InstanceType::Vrf),
            _ => None,
        }
    }
}

pub fn network_instance(name: &str) -> TreePath {
    NETWORK_INSTANCES.child_keyed(NETWORK_INSTANCE, Key::single(NAME, name))
}

pub fn protocols(ni: &str) -> TreePath {
    network_instance(ni).child("protocols")
}

pub fn protocol_key(identifier: &str, name: &str) -> Key {
    Key::single(IDENTIFIER, identifier).with(NAME, name)
}

pub fn protocol(ni: &str, identifier: &str, name: &str) -> TreePath {
    protocols(ni).child_keyed(PROTOCOL, protocol_key(identifier, name))
}

pub fn bgp(ni: &str, name: &str) -> TreePath {
    protocol(ni, BGP, name).child("bgp")
}

pub fn bgp_global(ni: &str, name: &str) -> TreePath {
    bgp(ni, name).child("global")
}

pub fn bgp_neighbors(ni: &str, name: &str) -> TreePath {
    bgp(ni, name).child("neighbors")
}

pub fn neighbor(ni: &str, name: &str, address: &str) -> TreePath {
    bgp_neighbors(ni, name).child_keyed("neighbor", Key::single("neighbor-address", address))
}

pub fn local_aggregates(ni: &str, name: &str) -> TreePath {
    protocol(ni, BGP, name).child("local-aggregates")
}

pub fn ospf_areas(ni: &str, name: &str) -> TreePath {
    protocol(ni, OSPF, name).join(&["ospfv2", "areas"])
}

pub fn ospf_global(ni: &str, name: &str) -> TreePath {
    protocol(ni, OSPF, name).join(&["ospfv2", "global"])
}

pub fn peer_groups(ni: &str, name: &str) -> TreePath {
    bgp(ni, name).child("peer-groups")
}

pub fn static_routes(ni: &str, name: &str) -> TreePath {
    protocol(ni, STATIC, name).child("static-routes")
}

pub fn ext_community_set(name: &str) -> TreePath {
    EXT_COMMUNITY_SETS.child_keyed("ext-community-set", Key::single("ext-community-set-name", name))
}

/// Network instance and protocol names of a path below `protocol[...]`.
pub fn protocol_scope(path: &TreePath) -> Result<(&str, &str), config_tree_core::PathError> {
    Ok((
        path.key_value(NETWORK_INSTANCE, NAME)?,
        path.key_value(PROTOCOL, NAME)?,
    ))
}

/// Leaf read either from the list entry itself or from its `config` container.
pub(crate) fn config_leaf<'a>(node: &'a ConfigNode, leaf: &str) -> Option<&'a str> {
    node.get_child("config")
        .and_then(|config| config.leaf_text(leaf))
        .or_else(|| node.leaf_text(leaf))
}

pub(crate) fn required<'a>(node: &'a ConfigNode, leaf: &'static str) -> Result<&'a str, CodecError> {
    config_leaf(node, leaf).ok_or(CodecError::Missing(leaf))
}

pub(crate) fn parse_field<T: std::str::FromStr>(
    node: &ConfigNode,
    field: &'static str,
) -> Result<Option<T>, CodecError> {
    config_leaf(node, field)
        .map(|value| {
            value.parse::<T>().map_err(|_| CodecError::Field {
                field,
                value: value.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::{neighbor, protocol_scope, InstanceType};

    #[test]
    fn neighbor_path_renders_canonical_layout() {
        assert_eq!(
            neighbor("default", "default", "10.1.0.4").to_string(),
            "/network-instances/network-instance[name=default]/protocols/protocol[identifier=BGP][name=default]/bgp/neighbors/neighbor[neighbor-address=10.1.0.4]"
        );
    }

    #[test]
    fn protocol_scope_extracts_keys() {
        let path = neighbor("CUST", "default", "10.1.0.4");
        assert_eq!(protocol_scope(&path), Ok(("CUST", "default")));
    }

    #[test]
    fn instance_type_accepts_prefixed_identities() {
        assert_eq!(
            InstanceType::from_canonical("openconfig-network-instance-types:L3VRF"),
            Some(InstanceType::Vrf)
        );
        assert_eq!(InstanceType::from_canonical("L2VSI"), None);
    }
}
