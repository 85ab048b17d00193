//! Junos style layout.
//!
//! ```text
//! /configuration/protocols/bgp/group[name]/neighbor[name]
//! /configuration/routing-instances/instance[name]/protocols/bgp/group[name]/neighbor[name]
//! /configuration/routing-instances/instance[name]/routing-options/aggregate/route[name]
//! ```

use std::sync::LazyLock;

use config_tree_core::{key_fields, Key, KeyFields, TreePath};

use super::Scope;
use crate::canonical::PeerType;

pub static CONFIGURATION: LazyLock<TreePath> =
    LazyLock::new(|| TreePath::root().child("configuration"));

pub static ROUTING_INSTANCES: LazyLock<TreePath> =
    LazyLock::new(|| CONFIGURATION.child("routing-instances"));

pub fn key_fields_registry() -> KeyFields {
    key_fields(&[
        ("instance", "name"),
        ("group", "name"),
        ("neighbor", "name"),
        ("route", "name"),
        ("policy", ""),
    ])
}

pub fn routing_instance(name: &str) -> TreePath {
    ROUTING_INSTANCES.child_keyed("instance", Key::single("name", name))
}

fn scope_root(scope: Scope<'_>) -> TreePath {
    match scope {
        Scope::Default => CONFIGURATION.clone(),
        Scope::Vrf(name) => routing_instance(name),
    }
}

pub fn bgp(scope: Scope<'_>) -> TreePath {
    scope_root(scope).join(&["protocols", "bgp"])
}

pub fn group(scope: Scope<'_>, group: &str) -> TreePath {
    bgp(scope).child_keyed("group", Key::single("name", group))
}

pub fn neighbor(scope: Scope<'_>, group_name: &str, address: &str) -> TreePath {
    group(scope, group_name).child_keyed("neighbor", Key::single("name", address))
}

pub fn aggregate_routes(vrf: &str) -> TreePath {
    routing_instance(vrf).join(&["routing-options", "aggregate"])
}

pub fn aggregate_route(vrf: &str, prefix: &str) -> TreePath {
    aggregate_routes(vrf).child_keyed("route", Key::single("name", prefix))
}

/// Group `type` leaf for a canonical peer type.
pub fn group_type(peer_type: PeerType) -> &'static str {
    match peer_type {
        PeerType::Internal => "internal",
        PeerType::External => "external",
    }
}

pub fn peer_type(group_type: &str) -> Option<PeerType> {
    match group_type {
        "internal" => Some(PeerType::Internal),
        "external" => Some(PeerType::External),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::neighbor;
    use crate::underlay::Scope;

    #[test]
    fn neighbors_live_under_groups() {
        assert_eq!(
            neighbor(Scope::Default, "EXT", "10.0.0.1").to_string(),
            "/configuration/protocols/bgp/group[name=EXT]/neighbor[name=10.0.0.1]"
        );
        assert_eq!(
            neighbor(Scope::Vrf("CUST"), "EXT", "10.0.0.1").to_string(),
            "/configuration/routing-instances/instance[name=CUST]/protocols/bgp/group[name=EXT]/neighbor[name=10.0.0.1]"
        );
    }
}
